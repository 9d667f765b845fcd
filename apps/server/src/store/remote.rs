use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{Backend, FellowshipStore, StoreError, StoreResult};
use crate::db::{self, DbPool};
use crate::models::fellowship_event::{DEFAULT_PARTICIPANT_ROLE, HOST_ROLE};
use crate::models::{
    BibleStudySession, CreateBibleStudySession, CreateEvent, CreateFellowshipEvent, CreateGroup,
    CreatePrayerRequest, Event, EventFilter, FellowshipEvent, FellowshipEventFilter,
    FellowshipGroup, FellowshipParticipant, GroupFilter, GroupMember, NewProfile, PrayerFilter,
    PrayerRequest, Profile,
};
use crate::registration::ValidationError;

const PROFILE_COLUMNS: &str = "id, username, full_name, email, password_hash, testimony, bio, \
     location, email_verified, profile_completed, guidelines_accepted, fellowship_preferences, \
     community_status, created_at, updated_at";

const FELLOWSHIP_EVENT_COLUMNS: &str = "id, title, description, event_type, start_time, \
     end_time, max_participants, is_public, recurring_pattern, recurring_until, created_by, \
     created_at, updated_at";

/// Store backed by the hosted PostgreSQL database
pub struct RemoteStore {
    pool: DbPool,
}

impl RemoteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn profile_conflict(err: sqlx::Error) -> StoreError {
    let field = match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            // profiles_email_key, profiles_email_lower_key, profiles_username_key
            match db_err.constraint() {
                Some(c) if c.contains("email") => Some("email"),
                Some(c) if c.contains("username") => Some("username"),
                _ => None,
            }
        }
        _ => None,
    };

    match field {
        Some("email") => StoreError::Validation(ValidationError::new(
            "email",
            "An account with this email already exists",
        )),
        Some("username") => {
            StoreError::Validation(ValidationError::new("username", "Username is already taken"))
        }
        _ => StoreError::Database(err),
    }
}

/// Turns a foreign key violation into `NotFound` for the referenced row.
///
/// Each entry names a column, the label used in the message and the id that
/// was bound to it; the column is matched against the violated constraint.
fn missing_reference(err: sqlx::Error, refs: &[(&str, &str, Option<Uuid>)]) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_foreign_key_violation() {
            let constraint = db_err.constraint().unwrap_or_default();
            if let Some((_, label, id)) = refs
                .iter()
                .find(|(column, _, _)| constraint.contains(*column))
            {
                return StoreError::NotFound(match id {
                    Some(id) => format!("{} {}", label, id),
                    None => label.to_string(),
                });
            }
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl FellowshipStore for RemoteStore {
    fn backend(&self) -> Backend {
        Backend::Remote
    }

    async fn health_check(&self) -> bool {
        db::health_check(&self.pool).await
    }

    async fn create_profile(&self, profile: NewProfile) -> StoreResult<Profile> {
        let query = format!(
            r#"
            INSERT INTO profiles (username, full_name, email, password_hash, testimony, bio,
                                  location, guidelines_accepted, fellowship_preferences)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );

        sqlx::query_as::<_, Profile>(&query)
            .bind(&profile.username)
            .bind(&profile.full_name)
            .bind(&profile.email)
            .bind(&profile.password_hash)
            .bind(&profile.testimony)
            .bind(&profile.bio)
            .bind(&profile.location)
            .bind(profile.guidelines_accepted)
            .bind(&profile.fellowship_preferences)
            .fetch_one(&self.pool)
            .await
            .map_err(profile_conflict)
    }

    async fn profile_by_email(&self, email: &str) -> StoreResult<Option<Profile>> {
        let query = format!(
            "SELECT {} FROM profiles WHERE LOWER(email) = LOWER($1)",
            PROFILE_COLUMNS
        );
        let profile = sqlx::query_as::<_, Profile>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn profile_by_id(&self, id: Uuid) -> StoreResult<Option<Profile>> {
        let query = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);
        let profile = sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(profile)
    }

    async fn create_group(&self, group: CreateGroup) -> StoreResult<FellowshipGroup> {
        let group = sqlx::query_as::<_, FellowshipGroup>(
            r#"
            INSERT INTO fellowship_groups (name, description, category, location_type,
                                           meeting_schedule, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, description, category, location_type, meeting_schedule,
                      created_by, created_at
            "#,
        )
        .bind(&group.name)
        .bind(&group.description)
        .bind(&group.category)
        .bind(&group.location_type)
        .bind(&group.meeting_schedule)
        .bind(group.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_reference(e, &[("created_by", "Profile", group.created_by)]))?;

        Ok(group)
    }

    async fn list_groups(&self, filter: &GroupFilter) -> StoreResult<Vec<FellowshipGroup>> {
        let groups = sqlx::query_as::<_, FellowshipGroup>(
            r#"
            SELECT id, name, description, category, location_type, meeting_schedule,
                   created_by, created_at
            FROM fellowship_groups
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR location_type = $2)
              AND ($3::text IS NULL OR POSITION(LOWER($3) IN LOWER(name)) > 0)
            ORDER BY created_at DESC
            "#,
        )
        .bind(&filter.category)
        .bind(&filter.location)
        .bind(&filter.search)
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn join_group(&self, group_id: Uuid, user_id: Uuid) -> StoreResult<GroupMember> {
        sqlx::query(
            r#"
            INSERT INTO group_members (group_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (group_id, user_id) DO NOTHING
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| missing_reference(e, &[("group_id", "Group", Some(group_id))]))?;

        let member = sqlx::query_as::<_, GroupMember>(
            r#"
            SELECT group_id, user_id, joined_at
            FROM group_members
            WHERE group_id = $1 AND user_id = $2
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }

    async fn create_prayer_request(
        &self,
        request: CreatePrayerRequest,
    ) -> StoreResult<PrayerRequest> {
        let created_by = if request.is_anonymous {
            None
        } else {
            request.created_by
        };

        let request = sqlx::query_as::<_, PrayerRequest>(
            r#"
            INSERT INTO prayer_requests (title, description, category, is_anonymous, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, title, description, category, is_anonymous, status, created_by,
                      created_at
            "#,
        )
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.category)
        .bind(request.is_anonymous)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_reference(e, &[("created_by", "Profile", created_by)]))?;

        Ok(request)
    }

    async fn list_prayer_requests(
        &self,
        filter: &PrayerFilter,
    ) -> StoreResult<Vec<PrayerRequest>> {
        let requests = sqlx::query_as::<_, PrayerRequest>(
            r#"
            SELECT id, title, description, category, is_anonymous, status, created_by,
                   created_at
            FROM prayer_requests
            WHERE ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(&filter.category)
        .bind(&filter.status)
        .fetch_all(&self.pool)
        .await?;

        Ok(requests)
    }

    async fn create_bible_study_session(
        &self,
        session: CreateBibleStudySession,
    ) -> StoreResult<BibleStudySession> {
        let session = sqlx::query_as::<_, BibleStudySession>(
            r#"
            INSERT INTO bible_study_sessions (group_id, title, scripture_reference, notes,
                                              session_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, group_id, title, scripture_reference, notes, session_date, created_at
            "#,
        )
        .bind(session.group_id)
        .bind(&session.title)
        .bind(&session.scripture_reference)
        .bind(&session.notes)
        .bind(session.session_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| missing_reference(e, &[("group_id", "Group", session.group_id)]))?;

        Ok(session)
    }

    async fn create_event(&self, event: CreateEvent) -> StoreResult<Event> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (group_id, title, description, event_date, location, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, group_id, title, description, event_date, location, created_by,
                      created_at
            "#,
        )
        .bind(event.group_id)
        .bind(&event.title)
        .bind(&event.description)
        .bind(event.event_date)
        .bind(&event.location)
        .bind(event.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            missing_reference(
                e,
                &[
                    ("group_id", "Group", event.group_id),
                    ("created_by", "Profile", event.created_by),
                ],
            )
        })?;

        Ok(event)
    }

    async fn list_events(&self, filter: &EventFilter) -> StoreResult<Vec<Event>> {
        let events = sqlx::query_as::<_, Event>(
            r#"
            SELECT id, group_id, title, description, event_date, location, created_by,
                   created_at
            FROM events
            WHERE event_date >= $1
              AND ($2::uuid IS NULL OR group_id = $2)
            ORDER BY event_date ASC
            "#,
        )
        .bind(Utc::now())
        .bind(filter.group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(events)
    }

    async fn create_fellowship_event(
        &self,
        event: CreateFellowshipEvent,
        host: Uuid,
    ) -> StoreResult<FellowshipEvent> {
        event.validate().map_err(StoreError::Validation)?;

        let mut tx = self.pool.begin().await?;

        let query = format!(
            r#"
            INSERT INTO fellowship_events (title, description, event_type, start_time, end_time,
                                           max_participants, is_public, recurring_pattern,
                                           recurring_until, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            FELLOWSHIP_EVENT_COLUMNS
        );
        let created = sqlx::query_as::<_, FellowshipEvent>(&query)
            .bind(&event.title)
            .bind(&event.description)
            .bind(event.event_type())
            .bind(event.start_time)
            .bind(event.end_time)
            .bind(event.max_participants)
            .bind(event.is_public)
            .bind(&event.recurring_pattern)
            .bind(event.recurring_until)
            .bind(host)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| missing_reference(e, &[("created_by", "Profile", Some(host))]))?;

        sqlx::query(
            "INSERT INTO fellowship_participants (event_id, user_id, role) VALUES ($1, $2, $3)",
        )
        .bind(created.id)
        .bind(host)
        .bind(HOST_ROLE)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(created)
    }

    async fn list_fellowship_events(
        &self,
        filter: &FellowshipEventFilter,
    ) -> StoreResult<Vec<FellowshipEvent>> {
        let query = format!(
            r#"
            SELECT {}
            FROM fellowship_events
            WHERE is_public
              AND start_time >= $1
              AND ($2::text IS NULL OR event_type = $2)
            ORDER BY start_time ASC
            LIMIT $3
            "#,
            FELLOWSHIP_EVENT_COLUMNS
        );
        let events = sqlx::query_as::<_, FellowshipEvent>(&query)
            .bind(Utc::now())
            .bind(&filter.event_type)
            .bind(filter.limit().map(|n| n as i64))
            .fetch_all(&self.pool)
            .await?;

        Ok(events)
    }

    async fn join_fellowship_event(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<FellowshipParticipant> {
        let mut tx = self.pool.begin().await?;

        // The row lock serialises joins so the capacity check holds
        let capacity = sqlx::query_scalar::<_, Option<i32>>(
            "SELECT max_participants FROM fellowship_events WHERE id = $1 FOR UPDATE",
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("Event {}", event_id)))?;

        let existing = sqlx::query_as::<_, FellowshipParticipant>(
            r#"
            SELECT id, event_id, user_id, role, joined_at
            FROM fellowship_participants
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if let Some(existing) = existing {
            return Ok(existing);
        }

        if let Some(max) = capacity {
            let joined: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM fellowship_participants WHERE event_id = $1",
            )
            .bind(event_id)
            .fetch_one(&mut *tx)
            .await?;
            if joined >= i64::from(max) {
                return Err(StoreError::Conflict(format!("Event {} is full", event_id)));
            }
        }

        let participant = sqlx::query_as::<_, FellowshipParticipant>(
            r#"
            INSERT INTO fellowship_participants (event_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, event_id, user_id, role, joined_at
            "#,
        )
        .bind(event_id)
        .bind(user_id)
        .bind(DEFAULT_PARTICIPANT_ROLE)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| missing_reference(e, &[("user_id", "Profile", Some(user_id))]))?;

        tx.commit().await?;

        Ok(participant)
    }

    async fn list_participants(&self, event_id: Uuid) -> StoreResult<Vec<FellowshipParticipant>> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM fellowship_events WHERE id = $1)")
                .bind(event_id)
                .fetch_one(&self.pool)
                .await?;
        if !exists {
            return Err(StoreError::NotFound(format!("Event {}", event_id)));
        }

        let participants = sqlx::query_as::<_, FellowshipParticipant>(
            r#"
            SELECT id, event_id, user_id, role, joined_at
            FROM fellowship_participants
            WHERE event_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participants)
    }
}
