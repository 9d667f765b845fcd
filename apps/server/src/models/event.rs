use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Community event, optionally tied to a group
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub group_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    pub location: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvent {
    #[serde(default)]
    pub group_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub event_date: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    /// Set from the session, never from the request body
    #[serde(skip)]
    pub created_by: Option<Uuid>,
}

/// Listing only ever returns upcoming events
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    pub group_id: Option<Uuid>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event, now: DateTime<Utc>) -> bool {
        event.event_date >= now && self.group_id.is_none_or(|g| event.group_id == Some(g))
    }
}

impl CreateEvent {
    pub fn into_event(self) -> Event {
        Event {
            id: Uuid::new_v4(),
            group_id: self.group_id,
            title: self.title,
            description: self.description,
            event_date: self.event_date,
            location: self.location,
            created_by: self.created_by,
            created_at: Utc::now(),
        }
    }
}
