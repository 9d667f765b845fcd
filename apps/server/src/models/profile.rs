use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

pub const DEFAULT_COMMUNITY_STATUS: &str = "pending";

/// Member profile as stored
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub testimony: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub email_verified: bool,
    pub profile_completed: bool,
    pub guidelines_accepted: bool,
    pub fellowship_preferences: serde_json::Value,
    pub community_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a profile; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub testimony: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub guidelines_accepted: bool,
    pub fellowship_preferences: serde_json::Value,
}

/// Profile as returned by the API (no credentials)
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub testimony: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub email_verified: bool,
    pub profile_completed: bool,
    pub community_status: String,
    pub created_at: DateTime<Utc>,
}

/// Preferences every new member starts with
pub fn default_fellowship_preferences() -> serde_json::Value {
    serde_json::json!({
        "eventTypes": [],
        "availableTimes": [],
        "studyInterests": [],
        "prayerTopics": []
    })
}

impl Profile {
    /// Hash a password using Argon2id
    pub fn hash_password(password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
        Ok(hash.to_string())
    }

    /// Verify a password against the stored hash
    pub fn verify_password(&self, password: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(&self.password_hash)
            .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    pub fn to_response(&self) -> ProfileResponse {
        ProfileResponse {
            id: self.id,
            username: self.username.clone(),
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            testimony: self.testimony.clone(),
            bio: self.bio.clone(),
            location: self.location.clone(),
            email_verified: self.email_verified,
            profile_completed: self.profile_completed,
            community_status: self.community_status.clone(),
            created_at: self.created_at,
        }
    }
}

impl NewProfile {
    /// Materialises the stored record with a fresh id and timestamps
    pub fn into_profile(self) -> Profile {
        let now = Utc::now();
        Profile {
            id: Uuid::new_v4(),
            username: self.username,
            full_name: self.full_name,
            email: self.email,
            password_hash: self.password_hash,
            testimony: self.testimony,
            bio: self.bio,
            location: self.location,
            email_verified: false,
            profile_completed: false,
            guidelines_accepted: self.guidelines_accepted,
            fellowship_preferences: self.fellowship_preferences,
            community_status: DEFAULT_COMMUNITY_STATUS.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
