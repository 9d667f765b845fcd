//! Unit tests for the JSON directory store

use chrono::{Duration, Utc};
use fellowship::models::{
    default_fellowship_preferences, CreateBibleStudySession, CreateEvent, CreateFellowshipEvent,
    CreateGroup, CreatePrayerRequest, EventFilter, FellowshipEventFilter, GroupFilter, NewProfile,
    PrayerFilter,
};
use fellowship::store::{Backend, FellowshipStore, LocalStore, StoreError};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use uuid::Uuid;

async fn open_store() -> (TempDir, LocalStore) {
    let dir = TempDir::new().unwrap();
    let store = LocalStore::open(dir.path()).await.unwrap();
    (dir, store)
}

fn new_profile(email: &str, username: &str) -> NewProfile {
    NewProfile {
        username: username.to_string(),
        full_name: "Timothy of Lystra".to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        testimony: "t".repeat(120),
        bio: None,
        location: Some("Lystra".to_string()),
        guidelines_accepted: true,
        fellowship_preferences: default_fellowship_preferences(),
    }
}

fn group(name: &str, category: Option<&str>) -> CreateGroup {
    CreateGroup {
        name: name.to_string(),
        description: None,
        category: category.map(str::to_string),
        location_type: Some("online".to_string()),
        meeting_schedule: Some("Thursdays 7pm".to_string()),
        created_by: None,
    }
}

fn prayer(title: &str, anonymous: bool, created_by: Option<Uuid>) -> CreatePrayerRequest {
    CreatePrayerRequest {
        title: title.to_string(),
        description: Some("Please pray with us".to_string()),
        category: Some("healing".to_string()),
        is_anonymous: anonymous,
        created_by,
    }
}

fn event(title: &str, in_days: i64, group_id: Option<Uuid>) -> CreateEvent {
    CreateEvent {
        group_id,
        title: title.to_string(),
        description: None,
        event_date: Utc::now() + Duration::days(in_days),
        location: None,
        created_by: None,
    }
}

fn gathering(title: &str, in_days: i64, max_participants: Option<i32>) -> CreateFellowshipEvent {
    let start = Utc::now() + Duration::days(in_days);
    CreateFellowshipEvent {
        title: title.to_string(),
        description: None,
        event_type: None,
        start_time: start,
        end_time: start + Duration::hours(2),
        max_participants,
        is_public: true,
        recurring_pattern: None,
        recurring_until: None,
    }
}

// =============================================================================
// Profiles
// =============================================================================

#[tokio::test]
async fn test_create_profile_defaults() {
    let (_dir, store) = open_store().await;

    let profile = store
        .create_profile(new_profile("tim@example.org", "timothy"))
        .await
        .unwrap();

    assert_eq!(store.backend(), Backend::Local);
    assert_eq!(profile.community_status, "pending");
    assert!(!profile.email_verified);
    assert!(profile.guidelines_accepted);

    let found = store.profile_by_email("TIM@example.org").await.unwrap();
    assert_eq!(found.map(|p| p.id), Some(profile.id));
}

#[tokio::test]
async fn test_duplicate_email_is_validation_error() {
    let (_dir, store) = open_store().await;
    store
        .create_profile(new_profile("tim@example.org", "timothy"))
        .await
        .unwrap();

    let err = store
        .create_profile(new_profile("Tim@Example.org", "other_name"))
        .await
        .unwrap_err();

    match err {
        StoreError::Validation(e) => assert_eq!(e.field, "email"),
        other => panic!("Expected validation error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_duplicate_username_is_validation_error() {
    let (_dir, store) = open_store().await;
    store
        .create_profile(new_profile("tim@example.org", "timothy"))
        .await
        .unwrap();

    let err = store
        .create_profile(new_profile("titus@example.org", "timothy"))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Validation(e) if e.field == "username"));
}

// =============================================================================
// Prayer requests
// =============================================================================

#[tokio::test]
async fn test_created_prayer_request_is_listed() {
    let (_dir, store) = open_store().await;

    let created = store
        .create_prayer_request(prayer("Healing for my mother", false, Some(Uuid::new_v4())))
        .await
        .unwrap();

    let listed = store
        .list_prayer_requests(&PrayerFilter::default())
        .await
        .unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
    assert_eq!(listed[0].status, "active");
}

#[tokio::test]
async fn test_anonymous_prayer_request_drops_author() {
    let (_dir, store) = open_store().await;

    let created = store
        .create_prayer_request(prayer("Unspoken request", true, Some(Uuid::new_v4())))
        .await
        .unwrap();

    assert!(created.is_anonymous);
    assert_eq!(created.created_by, None);
}

#[tokio::test]
async fn test_prayer_requests_filter_by_category() {
    let (_dir, store) = open_store().await;
    store
        .create_prayer_request(prayer("Healing", false, None))
        .await
        .unwrap();
    store
        .create_prayer_request(CreatePrayerRequest {
            category: Some("guidance".to_string()),
            ..prayer("New job", false, None)
        })
        .await
        .unwrap();

    let filter = PrayerFilter {
        category: Some("guidance".to_string()),
        status: None,
    };
    let listed = store.list_prayer_requests(&filter).await.unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "New job");
}

// =============================================================================
// Groups
// =============================================================================

#[tokio::test]
async fn test_join_group_is_idempotent() {
    let (_dir, store) = open_store().await;
    let group = store
        .create_group(group("Young Adults", Some("bible_study")))
        .await
        .unwrap();
    let user_id = Uuid::new_v4();

    let first = store.join_group(group.id, user_id).await.unwrap();
    let second = store.join_group(group.id, user_id).await.unwrap();

    assert_eq!(first.joined_at, second.joined_at);
}

#[tokio::test]
async fn test_join_unknown_group_is_not_found() {
    let (_dir, store) = open_store().await;

    let err = store
        .join_group(Uuid::new_v4(), Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_group_filters() {
    let (_dir, store) = open_store().await;
    store
        .create_group(group("Morning Prayer Circle", Some("prayer")))
        .await
        .unwrap();
    store
        .create_group(group("Romans Study", Some("bible_study")))
        .await
        .unwrap();

    let by_category = store
        .list_groups(&GroupFilter {
            category: Some("prayer".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_category.len(), 1);
    assert_eq!(by_category[0].name, "Morning Prayer Circle");

    let by_search = store
        .list_groups(&GroupFilter {
            search: Some("romans".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_search.len(), 1);
    assert_eq!(by_search[0].name, "Romans Study");

    let all = store.list_groups(&GroupFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);
}

// =============================================================================
// Events & study sessions
// =============================================================================

#[tokio::test]
async fn test_only_upcoming_events_soonest_first() {
    let (_dir, store) = open_store().await;
    store.create_event(event("Past picnic", -3, None)).await.unwrap();
    store.create_event(event("Retreat", 10, None)).await.unwrap();
    store.create_event(event("Worship night", 2, None)).await.unwrap();

    let titles: Vec<String> = store
        .list_events(&EventFilter::default())
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.title)
        .collect();

    assert_eq!(titles, vec!["Worship night", "Retreat"]);
}

#[tokio::test]
async fn test_events_filter_by_group() {
    let (_dir, store) = open_store().await;
    let group_id = store
        .create_group(group("Supper club", None))
        .await
        .unwrap()
        .id;
    store
        .create_event(event("Group supper", 1, Some(group_id)))
        .await
        .unwrap();
    store.create_event(event("Open night", 1, None)).await.unwrap();

    let events = store
        .list_events(&EventFilter {
            group_id: Some(group_id),
        })
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].title, "Group supper");
}

#[tokio::test]
async fn test_create_bible_study_session() {
    let (_dir, store) = open_store().await;

    let session = store
        .create_bible_study_session(CreateBibleStudySession {
            group_id: None,
            title: "Sermon on the Mount".to_string(),
            scripture_reference: Some("Matthew 5-7".to_string()),
            notes: None,
            session_date: None,
        })
        .await
        .unwrap();

    assert_eq!(session.title, "Sermon on the Mount");
}

#[tokio::test]
async fn test_event_for_unknown_group_is_not_found() {
    let (_dir, store) = open_store().await;
    let missing = Uuid::new_v4();

    let err = store
        .create_event(event("Orphan supper", 1, Some(missing)))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), format!("Group {} not found", missing));
    assert!(store
        .list_events(&EventFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_study_session_for_unknown_group_is_not_found() {
    let (_dir, store) = open_store().await;

    let err = store
        .create_bible_study_session(CreateBibleStudySession {
            group_id: Some(Uuid::new_v4()),
            title: "Acts 2".to_string(),
            scripture_reference: None,
            notes: None,
            session_date: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::NotFound(_)));
}

// =============================================================================
// Fellowship events
// =============================================================================

#[tokio::test]
async fn test_host_is_first_participant() {
    let (_dir, store) = open_store().await;
    let host = Uuid::new_v4();

    let created = store
        .create_fellowship_event(gathering("Prayer breakfast", 3, None), host)
        .await
        .unwrap();

    assert_eq!(created.event_type, "fellowship");
    assert_eq!(created.created_by, host);

    let participants = store.list_participants(created.id).await.unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0].user_id, host);
    assert_eq!(participants[0].role, "host");
}

#[tokio::test]
async fn test_join_fellowship_event_until_full() {
    let (_dir, store) = open_store().await;
    let event = store
        .create_fellowship_event(gathering("Hike and pray", 5, Some(2)), Uuid::new_v4())
        .await
        .unwrap();
    let member = Uuid::new_v4();

    let first = store.join_fellowship_event(event.id, member).await.unwrap();
    let again = store.join_fellowship_event(event.id, member).await.unwrap();
    assert_eq!(first.id, again.id);
    assert_eq!(first.role, "participant");

    let err = store
        .join_fellowship_event(event.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    assert_eq!(store.list_participants(event.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unknown_fellowship_event_is_not_found() {
    let (_dir, store) = open_store().await;
    let missing = Uuid::new_v4();

    let err = store
        .join_fellowship_event(missing, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), format!("Event {} not found", missing));

    assert!(matches!(
        store.list_participants(missing).await,
        Err(StoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_fellowship_events_public_upcoming_limited() {
    let (_dir, store) = open_store().await;
    let host = Uuid::new_v4();
    for (title, days) in [("Yesterday", -1), ("Next month", 30), ("Tomorrow", 1), ("Next week", 7)] {
        store
            .create_fellowship_event(gathering(title, days, None), host)
            .await
            .unwrap();
    }
    store
        .create_fellowship_event(
            CreateFellowshipEvent {
                is_public: false,
                ..gathering("Leaders only", 2, None)
            },
            host,
        )
        .await
        .unwrap();

    let titles: Vec<String> = store
        .list_fellowship_events(&FellowshipEventFilter {
            event_type: None,
            limit: Some(2),
        })
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.title)
        .collect();

    assert_eq!(titles, vec!["Tomorrow", "Next week"]);
}

#[tokio::test]
async fn test_fellowship_event_end_before_start_rejected() {
    let (_dir, store) = open_store().await;
    let mut draft = gathering("Backwards", 1, None);
    draft.end_time = draft.start_time - Duration::hours(1);

    let err = store
        .create_fellowship_event(draft, Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Validation(e) if e.field == "end_time"));
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_failed_write_keeps_no_row_in_memory() {
    let (dir, store) = open_store().await;
    std::fs::remove_dir_all(dir.path()).unwrap();

    let result = store
        .create_prayer_request(prayer("Lost in transit", false, None))
        .await;
    assert!(matches!(result, Err(StoreError::Io(_))));

    let listed = store
        .list_prayer_requests(&PrayerFilter::default())
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_reopen_keeps_records() {
    let dir = TempDir::new().unwrap();

    let created_id = {
        let store = LocalStore::open(dir.path()).await.unwrap();
        store
            .create_profile(new_profile("tim@example.org", "timothy"))
            .await
            .unwrap();
        store
            .create_prayer_request(prayer("Travel mercies", false, None))
            .await
            .unwrap()
            .id
    };

    let reopened = LocalStore::open(dir.path()).await.unwrap();

    let requests = reopened
        .list_prayer_requests(&PrayerFilter::default())
        .await
        .unwrap();
    assert_eq!(requests[0].id, created_id);
    assert!(reopened
        .profile_by_email("tim@example.org")
        .await
        .unwrap()
        .is_some());
    assert!(dir.path().join("prayer_requests.json").exists());
    assert!(!dir.path().join("prayer_requests.json.tmp").exists());
}

#[tokio::test]
async fn test_empty_table_file_reads_as_empty() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("events.json"), "").unwrap();

    let store = LocalStore::open(dir.path()).await.unwrap();

    assert!(store
        .list_events(&EventFilter::default())
        .await
        .unwrap()
        .is_empty());
    assert!(store.health_check().await);
}
