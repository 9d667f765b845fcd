use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FellowshipGroup {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub location_type: Option<String>,
    pub meeting_schedule: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// DTO for creating a group
#[derive(Debug, Clone, Deserialize)]
pub struct CreateGroup {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub location_type: Option<String>,
    #[serde(default)]
    pub meeting_schedule: Option<String>,
    /// Set from the session, never from the request body
    #[serde(skip)]
    pub created_by: Option<Uuid>,
}

/// Optional filters for listing groups
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupFilter {
    pub category: Option<String>,
    /// Matches `location_type`
    pub location: Option<String>,
    /// Case-insensitive substring of the group name
    pub search: Option<String>,
}

impl GroupFilter {
    pub fn matches(&self, group: &FellowshipGroup) -> bool {
        if let Some(category) = &self.category {
            if group.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if group.location_type.as_deref() != Some(location.as_str()) {
                return false;
            }
        }
        if let Some(search) = &self.search {
            if !group.name.to_lowercase().contains(&search.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GroupMember {
    pub group_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

impl CreateGroup {
    pub fn into_group(self) -> FellowshipGroup {
        FellowshipGroup {
            id: Uuid::new_v4(),
            name: self.name,
            description: self.description,
            category: self.category,
            location_type: self.location_type,
            meeting_schedule: self.meeting_schedule,
            created_by: self.created_by,
            created_at: Utc::now(),
        }
    }
}
