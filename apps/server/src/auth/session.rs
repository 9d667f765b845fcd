use actix_session::Session;
use actix_web::{dev::Payload, web, Error, FromRequest, HttpRequest};
use std::pin::Pin;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::Profile;
use crate::state::AppState;

const SESSION_USER_ID_KEY: &str = "user_id";

/// Store the signed-in profile id in the session
pub fn set_user_session(session: &Session, user_id: Uuid) -> AppResult<()> {
    session.renew();
    session
        .insert(SESSION_USER_ID_KEY, user_id)
        .map_err(|e| AppError::Internal(format!("Failed to set session: {}", e)))
}

/// Get the signed-in profile id from the session
pub fn get_user_id_from_session(session: &Session) -> Option<Uuid> {
    session.get::<Uuid>(SESSION_USER_ID_KEY).ok().flatten()
}

/// Clear session (sign out)
pub fn clear_session(session: &Session) {
    session.purge();
}

/// Extractor for the signed-in member (session-based)
pub struct AuthenticatedUser(pub Profile);

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let session = Session::extract(&req)
                .await
                .map_err(|_| AppError::Unauthorized("Session error".to_string()))?;

            let user_id = get_user_id_from_session(&session)
                .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))?;

            let state = req
                .app_data::<web::Data<AppState>>()
                .ok_or_else(|| AppError::Internal("Application state not found".to_string()))?;

            let profile = state
                .store
                .profile_by_id(user_id)
                .await
                .map_err(AppError::from)?
                .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

            Ok(AuthenticatedUser(profile))
        })
    }
}

/// Like [`AuthenticatedUser`] but never rejects the request
pub struct MaybeUser(pub Option<Uuid>);

impl FromRequest for MaybeUser {
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let user_id = match Session::extract(&req).await {
                Ok(session) => get_user_id_from_session(&session),
                Err(_) => None,
            };
            Ok(MaybeUser(user_id))
        })
    }
}
