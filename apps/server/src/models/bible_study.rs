use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BibleStudySession {
    pub id: Uuid,
    pub group_id: Option<Uuid>,
    pub title: String,
    pub scripture_reference: Option<String>,
    pub notes: Option<String>,
    pub session_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBibleStudySession {
    #[serde(default)]
    pub group_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub scripture_reference: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub session_date: Option<DateTime<Utc>>,
}

impl CreateBibleStudySession {
    pub fn into_session(self) -> BibleStudySession {
        BibleStudySession {
            id: Uuid::new_v4(),
            group_id: self.group_id,
            title: self.title,
            scripture_reference: self.scripture_reference,
            notes: self.notes,
            session_date: self.session_date,
            created_at: Utc::now(),
        }
    }
}
