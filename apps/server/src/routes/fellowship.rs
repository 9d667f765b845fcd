//! Community records: groups, prayer requests, study sessions, events and
//! member-hosted fellowship events.
//!
//! Every response uses the `{success, data}` / `{success: false, error}`
//! envelope whichever store backend is active.

use actix_web::{http::StatusCode, web, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{AuthenticatedUser, MaybeUser};
use crate::models::{
    CreateBibleStudySession, CreateEvent, CreateFellowshipEvent, CreateGroup,
    CreatePrayerRequest, EventFilter, FellowshipEventFilter, GroupFilter, PrayerFilter,
};
use crate::registration::ValidationError;
use crate::state::AppState;
use crate::store::{OperationResult, StoreError, StoreResult};

fn respond<T: Serialize>(result: StoreResult<T>, success: StatusCode) -> HttpResponse {
    match result {
        Ok(data) => HttpResponse::build(success).json(OperationResult::ok(data)),
        Err(err) => failure(err),
    }
}

fn failure(err: StoreError) -> HttpResponse {
    let status = match &err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        _ => {
            log::error!("Store operation failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    HttpResponse::build(status).json(OperationResult::<()>::failed(err.to_string()))
}

fn require(value: &str, field: &'static str) -> StoreResult<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(ValidationError::new(
            field,
            format!("{} is required", field),
        )));
    }
    Ok(())
}

/// GET /api/groups - List groups, optionally filtered
pub async fn list_groups(
    state: web::Data<AppState>,
    query: web::Query<GroupFilter>,
) -> HttpResponse {
    respond(state.store.list_groups(&query).await, StatusCode::OK)
}

/// POST /api/groups - Create a group
pub async fn create_group(
    state: web::Data<AppState>,
    user: MaybeUser,
    body: web::Json<CreateGroup>,
) -> HttpResponse {
    let mut group = body.into_inner();
    if let Err(e) = require(&group.name, "name") {
        return failure(e);
    }
    group.created_by = user.0;

    respond(state.store.create_group(group).await, StatusCode::CREATED)
}

/// POST /api/groups/{id}/join - Join a group as the signed-in member
pub async fn join_group(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> HttpResponse {
    let group_id = path.into_inner();
    respond(
        state.store.join_group(group_id, user.0.id).await,
        StatusCode::OK,
    )
}

/// GET /api/prayer-requests - Newest prayer requests first
pub async fn list_prayer_requests(
    state: web::Data<AppState>,
    query: web::Query<PrayerFilter>,
) -> HttpResponse {
    respond(state.store.list_prayer_requests(&query).await, StatusCode::OK)
}

/// POST /api/prayer-requests - Share a prayer request
pub async fn create_prayer_request(
    state: web::Data<AppState>,
    user: MaybeUser,
    body: web::Json<CreatePrayerRequest>,
) -> HttpResponse {
    let mut request = body.into_inner();
    if let Err(e) = require(&request.title, "title") {
        return failure(e);
    }
    request.created_by = user.0;

    respond(
        state.store.create_prayer_request(request).await,
        StatusCode::CREATED,
    )
}

/// POST /api/bible-study-sessions - Record a study session
pub async fn create_bible_study_session(
    state: web::Data<AppState>,
    body: web::Json<CreateBibleStudySession>,
) -> HttpResponse {
    let session = body.into_inner();
    if let Err(e) = require(&session.title, "title") {
        return failure(e);
    }

    respond(
        state.store.create_bible_study_session(session).await,
        StatusCode::CREATED,
    )
}

/// GET /api/events - Upcoming events, soonest first
pub async fn list_events(
    state: web::Data<AppState>,
    query: web::Query<EventFilter>,
) -> HttpResponse {
    respond(state.store.list_events(&query).await, StatusCode::OK)
}

/// POST /api/events - Schedule an event
pub async fn create_event(
    state: web::Data<AppState>,
    user: MaybeUser,
    body: web::Json<CreateEvent>,
) -> HttpResponse {
    let mut event = body.into_inner();
    if let Err(e) = require(&event.title, "title") {
        return failure(e);
    }
    event.created_by = user.0;

    respond(state.store.create_event(event).await, StatusCode::CREATED)
}

/// GET /api/fellowship-events - Upcoming public fellowship events
pub async fn list_fellowship_events(
    state: web::Data<AppState>,
    query: web::Query<FellowshipEventFilter>,
) -> HttpResponse {
    respond(
        state.store.list_fellowship_events(&query).await,
        StatusCode::OK,
    )
}

/// POST /api/fellowship-events - Host an event as the signed-in member
pub async fn create_fellowship_event(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    body: web::Json<CreateFellowshipEvent>,
) -> HttpResponse {
    respond(
        state
            .store
            .create_fellowship_event(body.into_inner(), user.0.id)
            .await,
        StatusCode::CREATED,
    )
}

/// POST /api/fellowship-events/{id}/join - Take a place at an event
pub async fn join_fellowship_event(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> HttpResponse {
    respond(
        state
            .store
            .join_fellowship_event(path.into_inner(), user.0.id)
            .await,
        StatusCode::OK,
    )
}

/// GET /api/fellowship-events/{id}/participants
pub async fn list_participants(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> HttpResponse {
    respond(
        state.store.list_participants(path.into_inner()).await,
        StatusCode::OK,
    )
}

/// Configure community routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/groups")
            .route(web::get().to(list_groups))
            .route(web::post().to(create_group)),
    )
    .route("/api/groups/{id}/join", web::post().to(join_group))
    .service(
        web::resource("/api/prayer-requests")
            .route(web::get().to(list_prayer_requests))
            .route(web::post().to(create_prayer_request)),
    )
    .route(
        "/api/bible-study-sessions",
        web::post().to(create_bible_study_session),
    )
    .service(
        web::resource("/api/events")
            .route(web::get().to(list_events))
            .route(web::post().to(create_event)),
    )
    .service(
        web::resource("/api/fellowship-events")
            .route(web::get().to(list_fellowship_events))
            .route(web::post().to(create_fellowship_event)),
    )
    .route(
        "/api/fellowship-events/{id}/join",
        web::post().to(join_fellowship_event),
    )
    .route(
        "/api/fellowship-events/{id}/participants",
        web::get().to(list_participants),
    );
}
