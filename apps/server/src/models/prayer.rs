use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_PRAYER_STATUS: &str = "active";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PrayerRequest {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_anonymous: bool,
    pub status: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// DTO for creating a prayer request
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePrayerRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    /// Set from the session, never from the request body
    #[serde(skip)]
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrayerFilter {
    pub category: Option<String>,
    pub status: Option<String>,
}

impl PrayerFilter {
    pub fn matches(&self, request: &PrayerRequest) -> bool {
        self.category
            .as_ref()
            .is_none_or(|c| request.category.as_deref() == Some(c.as_str()))
            && self.status.as_ref().is_none_or(|s| &request.status == s)
    }
}

impl CreatePrayerRequest {
    pub fn into_request(self) -> PrayerRequest {
        PrayerRequest {
            id: Uuid::new_v4(),
            title: self.title,
            description: self.description,
            category: self.category,
            is_anonymous: self.is_anonymous,
            status: DEFAULT_PRAYER_STATUS.to_string(),
            // Anonymous requests never record their author
            created_by: if self.is_anonymous {
                None
            } else {
                self.created_by
            },
            created_at: Utc::now(),
        }
    }
}
