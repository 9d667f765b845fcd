use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::registration::ValidationError;

pub const DEFAULT_EVENT_TYPE: &str = "fellowship";
pub const DEFAULT_PARTICIPANT_ROLE: &str = "participant";
pub const HOST_ROLE: &str = "host";

/// Gathering hosted by a member, joined through [`FellowshipParticipant`]
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FellowshipEvent {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub event_type: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_participants: Option<i32>,
    pub is_public: bool,
    pub recurring_pattern: Option<String>,
    pub recurring_until: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DTO for hosting an event; the host always comes from the session
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFellowshipEvent {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub max_participants: Option<i32>,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(default)]
    pub recurring_pattern: Option<String>,
    #[serde(default)]
    pub recurring_until: Option<DateTime<Utc>>,
}

fn default_public() -> bool {
    true
}

impl CreateFellowshipEvent {
    /// Title present, end after start, and room for at least one member
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::new("title", "title is required"));
        }
        if self.end_time <= self.start_time {
            return Err(ValidationError::new(
                "end_time",
                "end_time must be after start_time",
            ));
        }
        if matches!(self.max_participants, Some(n) if n < 1) {
            return Err(ValidationError::new(
                "max_participants",
                "max_participants must be at least 1",
            ));
        }
        if matches!(self.recurring_until, Some(until) if until < self.start_time) {
            return Err(ValidationError::new(
                "recurring_until",
                "recurring_until must not be before start_time",
            ));
        }
        Ok(())
    }

    pub fn event_type(&self) -> String {
        self.event_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_EVENT_TYPE)
            .to_string()
    }

    pub fn into_event(self, created_by: Uuid) -> FellowshipEvent {
        let now = Utc::now();
        FellowshipEvent {
            id: Uuid::new_v4(),
            event_type: self.event_type(),
            title: self.title,
            description: self.description,
            start_time: self.start_time,
            end_time: self.end_time,
            max_participants: self.max_participants,
            is_public: self.is_public,
            recurring_pattern: self.recurring_pattern,
            recurring_until: self.recurring_until,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Listing returns public events that have not started yet
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FellowshipEventFilter {
    pub event_type: Option<String>,
    pub limit: Option<i64>,
}

impl FellowshipEventFilter {
    pub fn matches(&self, event: &FellowshipEvent, now: DateTime<Utc>) -> bool {
        event.is_public
            && event.start_time >= now
            && self
                .event_type
                .as_ref()
                .is_none_or(|t| &event.event_type == t)
    }

    /// Row cap; negative values mean no cap
    pub fn limit(&self) -> Option<usize> {
        self.limit.and_then(|n| usize::try_from(n).ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FellowshipParticipant {
    pub id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

impl FellowshipParticipant {
    pub fn new(event_id: Uuid, user_id: Uuid, role: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_id,
            user_id,
            role: role.to_string(),
            joined_at: Utc::now(),
        }
    }
}
