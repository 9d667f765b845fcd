use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::error::AppResult;
use crate::models::profile::default_fellowship_preferences;
use crate::models::{NewProfile, Profile, ProfileResponse};
use crate::registration::{
    password_strength, AccountStep, PasswordStrength, ProfileStep, RegistrationFlow,
    RegistrationStep,
};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(flatten)]
    pub account: AccountStep,
    #[serde(flatten)]
    pub profile: ProfileStep,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Serialize)]
struct AccountStepResponse {
    next_step: RegistrationStep,
    password_strength: PasswordStrength,
}

#[derive(Serialize)]
struct RegisterResponse {
    user: ProfileResponse,
}

/// POST /api/register/account - Check step 1 before showing step 2
pub async fn check_account(body: web::Json<AccountStep>) -> AppResult<HttpResponse> {
    let account = body.into_inner();
    let strength = password_strength(&account.password);

    let mut flow = RegistrationFlow::new();
    flow.submit_account(account)?;

    Ok(HttpResponse::Ok().json(AccountStepResponse {
        next_step: flow.step(),
        password_strength: strength,
    }))
}

/// POST /api/register - Run both steps, create the profile and sign in
pub async fn register(
    state: web::Data<AppState>,
    session: Session,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();

    let mut flow = RegistrationFlow::new();
    flow.submit_account(request.account)?;
    let registration = flow.submit_profile(request.profile)?;

    let password_hash = Profile::hash_password(&registration.password)?;
    let profile = state
        .store
        .create_profile(NewProfile {
            username: registration.username,
            full_name: registration.full_name,
            email: registration.email,
            password_hash,
            testimony: registration.testimony,
            bio: request.bio,
            location: request.location,
            guidelines_accepted: true,
            fellowship_preferences: default_fellowship_preferences(),
        })
        .await?;

    log::info!("New member registered: {}", profile.username);

    auth::set_user_session(&session, profile.id)?;

    Ok(HttpResponse::Created().json(RegisterResponse {
        user: profile.to_response(),
    }))
}

/// Configure registration routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/register/account", web::post().to(check_account))
        .route("/api/register", web::post().to(register));
}
