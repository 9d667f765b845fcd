use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Backend, FellowshipStore, StoreError, StoreResult};
use crate::models::fellowship_event::{DEFAULT_PARTICIPANT_ROLE, HOST_ROLE};
use crate::models::{
    BibleStudySession, CreateBibleStudySession, CreateEvent, CreateFellowshipEvent, CreateGroup,
    CreatePrayerRequest, Event, EventFilter, FellowshipEvent, FellowshipEventFilter,
    FellowshipGroup, FellowshipParticipant, GroupFilter, GroupMember, NewProfile, PrayerFilter,
    PrayerRequest, Profile,
};
use crate::registration::ValidationError;

const PROFILES: &str = "profiles";
const GROUPS: &str = "fellowship_groups";
const MEMBERS: &str = "group_members";
const PRAYER_REQUESTS: &str = "prayer_requests";
const STUDY_SESSIONS: &str = "bible_study_sessions";
const EVENTS: &str = "events";
const FELLOWSHIP_EVENTS: &str = "fellowship_events";
const PARTICIPANTS: &str = "fellowship_participants";

#[derive(Default)]
struct Tables {
    profiles: Vec<Profile>,
    groups: Vec<FellowshipGroup>,
    members: Vec<GroupMember>,
    prayer_requests: Vec<PrayerRequest>,
    sessions: Vec<BibleStudySession>,
    events: Vec<Event>,
    fellowship_events: Vec<FellowshipEvent>,
    participants: Vec<FellowshipParticipant>,
}

impl Tables {
    fn require_group(&self, group_id: Option<Uuid>) -> StoreResult<()> {
        match group_id {
            Some(id) if !self.groups.iter().any(|g| g.id == id) => {
                Err(StoreError::NotFound(format!("Group {}", id)))
            }
            _ => Ok(()),
        }
    }

    fn fellowship_event(&self, event_id: Uuid) -> StoreResult<&FellowshipEvent> {
        self.fellowship_events
            .iter()
            .find(|e| e.id == event_id)
            .ok_or_else(|| StoreError::NotFound(format!("Event {}", event_id)))
    }
}

/// Store keeping each table as a JSON array in `<dir>/<table>.json`.
///
/// All tables are held in memory behind one lock and the touched table is
/// rewritten after every insert. Only writers inside this process are
/// serialised.
pub struct LocalStore {
    dir: PathBuf,
    tables: Mutex<Tables>,
}

impl LocalStore {
    /// Opens (creating if needed) the store directory and loads every table
    pub async fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;

        let tables = Tables {
            profiles: read_table(&dir, PROFILES).await?,
            groups: read_table(&dir, GROUPS).await?,
            members: read_table(&dir, MEMBERS).await?,
            prayer_requests: read_table(&dir, PRAYER_REQUESTS).await?,
            sessions: read_table(&dir, STUDY_SESSIONS).await?,
            events: read_table(&dir, EVENTS).await?,
            fellowship_events: read_table(&dir, FELLOWSHIP_EVENTS).await?,
            participants: read_table(&dir, PARTICIPANTS).await?,
        };

        log::info!("Local store opened at {}", dir.display());

        Ok(Self {
            dir,
            tables: Mutex::new(tables),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn table_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{}.json", table))
}

async fn read_table<T: DeserializeOwned>(dir: &Path, table: &str) -> StoreResult<Vec<T>> {
    match tokio::fs::read(table_path(dir, table)).await {
        Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(StoreError::Io(e)),
    }
}

/// Writes through a temporary file so a crash never leaves half a table
async fn write_table<T: Serialize>(dir: &Path, table: &str, rows: &[T]) -> StoreResult<()> {
    let path = table_path(dir, table);
    let tmp = dir.join(format!("{}.json.tmp", table));
    let bytes = serde_json::to_vec_pretty(rows)?;
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, &path).await?;
    Ok(())
}

/// Appends `row` and rewrites the table; the row is dropped again if the
/// write fails, so memory never holds what the file does not
async fn insert_row<T: Serialize + Clone>(
    dir: &Path,
    table: &str,
    rows: &mut Vec<T>,
    row: T,
) -> StoreResult<T> {
    rows.push(row.clone());
    if let Err(e) = write_table(dir, table, rows).await {
        rows.pop();
        return Err(e);
    }
    Ok(row)
}

#[async_trait]
impl FellowshipStore for LocalStore {
    fn backend(&self) -> Backend {
        Backend::Local
    }

    async fn health_check(&self) -> bool {
        tokio::fs::metadata(&self.dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn create_profile(&self, profile: NewProfile) -> StoreResult<Profile> {
        let mut tables = self.tables.lock().await;

        if tables
            .profiles
            .iter()
            .any(|p| p.email.eq_ignore_ascii_case(&profile.email))
        {
            return Err(StoreError::Validation(ValidationError::new(
                "email",
                "An account with this email already exists",
            )));
        }
        if tables.profiles.iter().any(|p| p.username == profile.username) {
            return Err(StoreError::Validation(ValidationError::new(
                "username",
                "Username is already taken",
            )));
        }

        insert_row(&self.dir, PROFILES, &mut tables.profiles, profile.into_profile()).await
    }

    async fn profile_by_email(&self, email: &str) -> StoreResult<Option<Profile>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .profiles
            .iter()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn profile_by_id(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        let tables = self.tables.lock().await;
        Ok(tables.profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn create_group(&self, group: CreateGroup) -> StoreResult<FellowshipGroup> {
        let mut tables = self.tables.lock().await;
        insert_row(&self.dir, GROUPS, &mut tables.groups, group.into_group()).await
    }

    async fn list_groups(&self, filter: &GroupFilter) -> StoreResult<Vec<FellowshipGroup>> {
        let tables = self.tables.lock().await;
        let mut groups: Vec<FellowshipGroup> = tables
            .groups
            .iter()
            .filter(|g| filter.matches(g))
            .cloned()
            .collect();
        groups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(groups)
    }

    async fn join_group(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<GroupMember> {
        let mut tables = self.tables.lock().await;

        if !tables.groups.iter().any(|g| g.id == group_id) {
            return Err(StoreError::NotFound(format!("Group {}", group_id)));
        }

        if let Some(existing) = tables
            .members
            .iter()
            .find(|m| m.group_id == group_id && m.user_id == user_id)
        {
            return Ok(existing.clone());
        }

        let member = GroupMember {
            group_id,
            user_id,
            joined_at: Utc::now(),
        };
        insert_row(&self.dir, MEMBERS, &mut tables.members, member).await
    }

    async fn create_prayer_request(
        &self,
        request: CreatePrayerRequest,
    ) -> StoreResult<PrayerRequest> {
        let mut tables = self.tables.lock().await;
        insert_row(
            &self.dir,
            PRAYER_REQUESTS,
            &mut tables.prayer_requests,
            request.into_request(),
        )
        .await
    }

    async fn list_prayer_requests(
        &self,
        filter: &PrayerFilter,
    ) -> StoreResult<Vec<PrayerRequest>> {
        let tables = self.tables.lock().await;
        let mut requests: Vec<PrayerRequest> = tables
            .prayer_requests
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn create_bible_study_session(
        &self,
        session: CreateBibleStudySession,
    ) -> StoreResult<BibleStudySession> {
        let mut tables = self.tables.lock().await;
        tables.require_group(session.group_id)?;
        insert_row(
            &self.dir,
            STUDY_SESSIONS,
            &mut tables.sessions,
            session.into_session(),
        )
        .await
    }

    async fn create_event(&self, event: CreateEvent) -> StoreResult<Event> {
        let mut tables = self.tables.lock().await;
        tables.require_group(event.group_id)?;
        insert_row(&self.dir, EVENTS, &mut tables.events, event.into_event()).await
    }

    async fn list_events(&self, filter: &EventFilter) -> StoreResult<Vec<Event>> {
        let now = Utc::now();
        let tables = self.tables.lock().await;
        let mut events: Vec<Event> = tables
            .events
            .iter()
            .filter(|e| filter.matches(e, now))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.event_date);
        Ok(events)
    }

    async fn create_fellowship_event(
        &self,
        event: CreateFellowshipEvent,
        host: Uuid,
    ) -> StoreResult<FellowshipEvent> {
        event.validate().map_err(StoreError::Validation)?;

        let mut tables = self.tables.lock().await;
        let event = insert_row(
            &self.dir,
            FELLOWSHIP_EVENTS,
            &mut tables.fellowship_events,
            event.into_event(host),
        )
        .await?;

        let host = FellowshipParticipant::new(event.id, host, HOST_ROLE);
        if let Err(e) = insert_row(&self.dir, PARTICIPANTS, &mut tables.participants, host).await
        {
            tables.fellowship_events.pop();
            if let Err(rollback) =
                write_table(&self.dir, FELLOWSHIP_EVENTS, &tables.fellowship_events).await
            {
                log::error!("Cannot roll back event {}: {}", event.id, rollback);
            }
            return Err(e);
        }

        Ok(event)
    }

    async fn list_fellowship_events(
        &self,
        filter: &FellowshipEventFilter,
    ) -> StoreResult<Vec<FellowshipEvent>> {
        let now = Utc::now();
        let tables = self.tables.lock().await;
        let mut events: Vec<FellowshipEvent> = tables
            .fellowship_events
            .iter()
            .filter(|e| filter.matches(e, now))
            .cloned()
            .collect();
        events.sort_by_key(|e| e.start_time);
        if let Some(limit) = filter.limit() {
            events.truncate(limit);
        }
        Ok(events)
    }

    async fn join_fellowship_event(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<FellowshipParticipant> {
        let mut tables = self.tables.lock().await;
        let capacity = tables.fellowship_event(event_id)?.max_participants;

        if let Some(existing) = tables
            .participants
            .iter()
            .find(|p| p.event_id == event_id && p.user_id == user_id)
        {
            return Ok(existing.clone());
        }

        let joined = tables
            .participants
            .iter()
            .filter(|p| p.event_id == event_id)
            .count();
        if capacity.is_some_and(|max| joined >= max as usize) {
            return Err(StoreError::Conflict(format!("Event {} is full", event_id)));
        }

        let participant = FellowshipParticipant::new(event_id, user_id, DEFAULT_PARTICIPANT_ROLE);
        insert_row(&self.dir, PARTICIPANTS, &mut tables.participants, participant).await
    }

    async fn list_participants(&self, event_id: Uuid) -> StoreResult<Vec<FellowshipParticipant>> {
        let tables = self.tables.lock().await;
        tables.fellowship_event(event_id)?;

        let mut participants: Vec<FellowshipParticipant> = tables
            .participants
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect();
        participants.sort_by_key(|p| p.joined_at);
        Ok(participants)
    }
}
