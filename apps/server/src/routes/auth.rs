use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::auth::{self, AuthenticatedUser};
use crate::error::{AppError, AppResult};
use crate::models::ProfileResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
struct AuthResponse {
    user: ProfileResponse,
}

/// POST /auth/login
/// Authenticate a member and create a session
pub async fn login(
    state: web::Data<AppState>,
    session: Session,
    req: web::Json<LoginRequest>,
) -> AppResult<impl Responder> {
    let email = req.email.trim().to_lowercase();
    let profile = state
        .store
        .profile_by_email(&email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !profile.verify_password(&req.password)? {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    auth::set_user_session(&session, profile.id)?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        user: profile.to_response(),
    }))
}

/// POST /auth/logout
/// Clear session
pub async fn logout(session: Session) -> impl Responder {
    auth::clear_session(&session);
    HttpResponse::NoContent().finish()
}

/// GET /auth/me
/// Get the signed-in member
pub async fn get_current_user(user: AuthenticatedUser) -> impl Responder {
    HttpResponse::Ok().json(user.0.to_response())
}

/// Configure auth routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/me", web::get().to(get_current_user)),
    );
}
