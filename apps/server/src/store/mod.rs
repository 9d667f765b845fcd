//! Persistence for community records.
//!
//! [`FellowshipStore`] has two implementations chosen once at startup:
//! [`RemoteStore`] on the hosted PostgreSQL database and [`LocalStore`], a
//! directory of JSON documents used when no database is reachable.

pub mod local;
pub mod remote;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::models::{
    BibleStudySession, CreateBibleStudySession, CreateEvent, CreateFellowshipEvent, CreateGroup,
    CreatePrayerRequest, Event, EventFilter, FellowshipEvent, FellowshipEventFilter,
    FellowshipGroup, FellowshipParticipant, GroupFilter, GroupMember, NewProfile, PrayerFilter,
    PrayerRequest, Profile,
};
use crate::registration::ValidationError;

pub use local::LocalStore;
pub use remote::RemoteStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Which implementation is serving requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    Remote,
    Local,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Remote => write!(f, "remote"),
            Backend::Local => write!(f, "local"),
        }
    }
}

/// Outcome envelope returned by the community endpoints
#[derive(Debug, Serialize)]
pub struct OperationResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> OperationResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait FellowshipStore: Send + Sync {
    fn backend(&self) -> Backend;

    async fn health_check(&self) -> bool;

    // Profiles

    /// Fails with `Validation` when the email or username is taken
    async fn create_profile(&self, profile: NewProfile) -> StoreResult<Profile>;

    async fn profile_by_email(&self, email: &str) -> StoreResult<Option<Profile>>;

    async fn profile_by_id(&self, id: Uuid) -> StoreResult<Option<Profile>>;

    // Groups

    async fn create_group(&self, group: CreateGroup) -> StoreResult<FellowshipGroup>;

    async fn list_groups(&self, filter: &GroupFilter) -> StoreResult<Vec<FellowshipGroup>>;

    /// Idempotent; `NotFound` for an unknown group
    async fn join_group(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<GroupMember>;

    // Prayer requests

    async fn create_prayer_request(
        &self,
        request: CreatePrayerRequest,
    ) -> StoreResult<PrayerRequest>;

    /// Newest first
    async fn list_prayer_requests(&self, filter: &PrayerFilter)
        -> StoreResult<Vec<PrayerRequest>>;

    // Bible study

    /// `NotFound` when `group_id` names no group
    async fn create_bible_study_session(
        &self,
        session: CreateBibleStudySession,
    ) -> StoreResult<BibleStudySession>;

    // Events

    /// `NotFound` when `group_id` names no group
    async fn create_event(&self, event: CreateEvent) -> StoreResult<Event>;

    /// Upcoming events only, soonest first
    async fn list_events(&self, filter: &EventFilter) -> StoreResult<Vec<Event>>;

    // Fellowship events

    /// Stores the event and records `host` as its first participant
    async fn create_fellowship_event(
        &self,
        event: CreateFellowshipEvent,
        host: Uuid,
    ) -> StoreResult<FellowshipEvent>;

    /// Public events that have not started, soonest first
    async fn list_fellowship_events(
        &self,
        filter: &FellowshipEventFilter,
    ) -> StoreResult<Vec<FellowshipEvent>>;

    /// Idempotent; `NotFound` for an unknown event, `Conflict` once it is full
    async fn join_fellowship_event(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<FellowshipParticipant>;

    /// Earliest joiner first; `NotFound` for an unknown event
    async fn list_participants(&self, event_id: Uuid) -> StoreResult<Vec<FellowshipParticipant>>;
}

/// Picks the store once: the database when it connects and migrates,
/// otherwise the local directory store
pub async fn connect(config: &Config) -> StoreResult<Arc<dyn FellowshipStore>> {
    match &config.database {
        Some(database) => match db::connect(database).await {
            Ok(pool) => {
                log::info!("Using remote store");
                return Ok(Arc::new(RemoteStore::new(pool)));
            }
            Err(e) => log::warn!("Database unavailable: {}", e),
        },
        None => log::warn!("DATABASE_URL not configured"),
    }

    log::warn!(
        "Falling back to local store at {}",
        config.local_store_dir.display()
    );
    let store = LocalStore::open(&config.local_store_dir).await?;
    Ok(Arc::new(store))
}
