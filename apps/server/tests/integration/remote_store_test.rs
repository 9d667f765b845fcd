//! Integration tests for the PostgreSQL store
//!
//! Each test starts its own container and applies the migrations.

use crate::common::TestDb;
use chrono::{Duration, Utc};
use fellowship::models::{
    default_fellowship_preferences, CreateBibleStudySession, CreateEvent, CreateFellowshipEvent,
    CreateGroup, CreatePrayerRequest, EventFilter, FellowshipEventFilter, GroupFilter, NewProfile,
    PrayerFilter,
};
use fellowship::store::{Backend, FellowshipStore, StoreError};
use pretty_assertions::assert_eq;
use uuid::Uuid;

fn new_profile(email: &str, username: &str) -> NewProfile {
    NewProfile {
        username: username.to_string(),
        full_name: "Phoebe of Cenchreae".to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        testimony: "t".repeat(120),
        bio: Some("Deacon".to_string()),
        location: None,
        guidelines_accepted: true,
        fellowship_preferences: default_fellowship_preferences(),
    }
}

fn group(name: &str, category: &str) -> CreateGroup {
    CreateGroup {
        name: name.to_string(),
        description: None,
        category: Some(category.to_string()),
        location_type: Some("in_person".to_string()),
        meeting_schedule: None,
        created_by: None,
    }
}

#[tokio::test]
async fn test_profile_defaults_and_lookup() {
    let db = TestDb::new().await;
    let store = db.store();

    let profile = store
        .create_profile(new_profile("phoebe@example.org", "phoebe"))
        .await
        .unwrap();

    assert_eq!(store.backend(), Backend::Remote);
    assert!(store.health_check().await);
    assert_eq!(profile.community_status, "pending");
    assert_eq!(profile.fellowship_preferences, default_fellowship_preferences());

    let by_email = store.profile_by_email("PHOEBE@example.org").await.unwrap();
    assert_eq!(by_email.map(|p| p.id), Some(profile.id));

    let by_id = store.profile_by_id(profile.id).await.unwrap().unwrap();
    assert_eq!(by_id.username, "phoebe");
}

#[tokio::test]
async fn test_duplicate_profile_fields() {
    let db = TestDb::new().await;
    let store = db.store();
    store
        .create_profile(new_profile("phoebe@example.org", "phoebe"))
        .await
        .unwrap();

    let email_err = store
        .create_profile(new_profile("phoebe@example.org", "someone_else"))
        .await
        .unwrap_err();
    assert!(matches!(email_err, StoreError::Validation(e) if e.field == "email"));

    let username_err = store
        .create_profile(new_profile("other@example.org", "phoebe"))
        .await
        .unwrap_err();
    assert!(matches!(username_err, StoreError::Validation(e) if e.field == "username"));
}

#[tokio::test]
async fn test_email_unique_regardless_of_case() {
    let db = TestDb::new().await;
    let store = db.store();
    store
        .create_profile(new_profile("phoebe@example.org", "phoebe"))
        .await
        .unwrap();

    let err = store
        .create_profile(new_profile("Phoebe@EXAMPLE.org", "phoebe_two"))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::Validation(e) if e.field == "email"));
}

#[tokio::test]
async fn test_unknown_author_is_not_found() {
    let db = TestDb::new().await;
    let store = db.store();
    let ghost = Uuid::new_v4();

    let err = store
        .create_prayer_request(CreatePrayerRequest {
            title: "Comfort".to_string(),
            description: None,
            category: None,
            is_anonymous: false,
            created_by: Some(ghost),
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), format!("Profile {} not found", ghost));

    let err = store
        .create_group(CreateGroup {
            created_by: Some(ghost),
            ..group("Ghost town", "prayer")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_prayer_request_listed_with_active_status() {
    let db = TestDb::new().await;
    let store = db.store();

    let created = store
        .create_prayer_request(CreatePrayerRequest {
            title: "Wisdom for a decision".to_string(),
            description: None,
            category: Some("guidance".to_string()),
            is_anonymous: true,
            created_by: Some(Uuid::new_v4()),
        })
        .await
        .unwrap();

    assert_eq!(created.status, "active");
    assert_eq!(created.created_by, None);

    let listed = store
        .list_prayer_requests(&PrayerFilter {
            category: Some("guidance".to_string()),
            status: Some("active".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
}

#[tokio::test]
async fn test_group_filters_and_join() {
    let db = TestDb::new().await;
    let store = db.store();

    let romans = store
        .create_group(group("Romans Study", "bible_study"))
        .await
        .unwrap();
    store
        .create_group(group("Morning Prayer", "prayer"))
        .await
        .unwrap();

    let found = store
        .list_groups(&GroupFilter {
            search: Some("ROMANS".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, romans.id);

    let prayer_groups = store
        .list_groups(&GroupFilter {
            category: Some("prayer".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(prayer_groups.len(), 1);

    let user_id = Uuid::new_v4();
    let first = store.join_group(romans.id, user_id).await.unwrap();
    let second = store.join_group(romans.id, user_id).await.unwrap();
    assert_eq!(first.joined_at, second.joined_at);

    let err = store
        .join_group(Uuid::new_v4(), user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_unknown_group_reference_is_not_found() {
    let db = TestDb::new().await;
    let store = db.store();
    let missing = Uuid::new_v4();

    let err = store
        .create_event(CreateEvent {
            group_id: Some(missing),
            title: "Supper".to_string(),
            description: None,
            event_date: Utc::now() + Duration::days(1),
            location: None,
            created_by: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), format!("Group {} not found", missing));

    let err = store
        .create_bible_study_session(CreateBibleStudySession {
            group_id: Some(missing),
            title: "Acts 2".to_string(),
            scripture_reference: None,
            notes: None,
            session_date: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_only_upcoming_events() {
    let db = TestDb::new().await;
    let store = db.store();

    for (title, offset) in [("Past", -2), ("Later", 20), ("Soon", 1)] {
        store
            .create_event(CreateEvent {
                group_id: None,
                title: title.to_string(),
                description: None,
                event_date: Utc::now() + Duration::days(offset),
                location: None,
                created_by: None,
            })
            .await
            .unwrap();
    }

    let titles: Vec<String> = store
        .list_events(&EventFilter::default())
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.title)
        .collect();

    assert_eq!(titles, vec!["Soon", "Later"]);
}

#[tokio::test]
async fn test_fellowship_event_capacity_and_listing() {
    let db = TestDb::new().await;
    let store = db.store();
    let host = store
        .create_profile(new_profile("phoebe@example.org", "phoebe"))
        .await
        .unwrap();
    let priscilla = store
        .create_profile(new_profile("priscilla@example.org", "priscilla"))
        .await
        .unwrap();
    let aquila = store
        .create_profile(new_profile("aquila@example.org", "aquila"))
        .await
        .unwrap();

    let start = Utc::now() + Duration::days(2);
    let event = store
        .create_fellowship_event(
            CreateFellowshipEvent {
                title: "House church supper".to_string(),
                description: None,
                event_type: Some("meal".to_string()),
                start_time: start,
                end_time: start + Duration::hours(3),
                max_participants: Some(2),
                is_public: true,
                recurring_pattern: None,
                recurring_until: None,
            },
            host.id,
        )
        .await
        .unwrap();

    let joined = store
        .join_fellowship_event(event.id, priscilla.id)
        .await
        .unwrap();
    let again = store
        .join_fellowship_event(event.id, priscilla.id)
        .await
        .unwrap();
    assert_eq!(joined.id, again.id);

    let err = store
        .join_fellowship_event(event.id, aquila.id)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    let participants = store.list_participants(event.id).await.unwrap();
    let roles: Vec<&str> = participants.iter().map(|p| p.role.as_str()).collect();
    assert_eq!(roles, vec!["host", "participant"]);

    let listed = store
        .list_fellowship_events(&FellowshipEventFilter {
            event_type: Some("meal".to_string()),
            limit: Some(5),
        })
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, event.id);

    let err = store
        .join_fellowship_event(Uuid::new_v4(), aquila.id)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}
