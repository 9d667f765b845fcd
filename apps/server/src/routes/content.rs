use actix_web::{web, HttpResponse};
use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::integrations::bible::TranslationInfo;
use crate::integrations::BibleService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerseQuery {
    pub reference: Option<String>,
    pub translation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DailyVerseQuery {
    /// Defaults to today (UTC)
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub month: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Serialize)]
struct VersionsResponse<'a> {
    default: &'a str,
    versions: Vec<TranslationInfo>,
}

fn required(value: Option<String>, name: &str) -> AppResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::invalid(format!("Query parameter '{}' is required", name)))
}

/// GET /api/content/verse - Look up a verse by reference
pub async fn get_verse(
    state: web::Data<AppState>,
    query: web::Query<VerseQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let reference = required(query.reference, "reference")?;

    let verse = state
        .bible
        .verse(&reference, query.translation.as_deref())
        .await;

    Ok(HttpResponse::Ok().json(verse))
}

/// GET /api/content/verse/daily - Verse of the day
pub async fn get_daily_verse(
    state: web::Data<AppState>,
    query: web::Query<DailyVerseQuery>,
) -> HttpResponse {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    HttpResponse::Ok().json(state.bible.daily_verse(date).await)
}

/// GET /api/content/search - Full-text Bible search
pub async fn search(
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let q = required(query.q, "q")?;

    Ok(HttpResponse::Ok().json(state.bible.search(&q, query.limit).await))
}

/// GET /api/content/versions - Supported translations
pub async fn versions(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(VersionsResponse {
        default: state.bible.default_translation(),
        versions: BibleService::versions(),
    })
}

/// GET /api/content/quote - Quote of the day
pub async fn get_quote(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.quotes.daily_quote().await)
}

/// GET /api/content/news - Latest articles from the configured feeds
pub async fn get_news(state: web::Data<AppState>, query: web::Query<NewsQuery>) -> HttpResponse {
    HttpResponse::Ok().json(state.news.latest(query.limit).await)
}

/// GET /api/content/calendar - Feasts in a month
pub async fn get_calendar(
    state: web::Data<AppState>,
    query: web::Query<CalendarQuery>,
) -> AppResult<HttpResponse> {
    let today = Utc::now().date_naive();
    let month = query.month.unwrap_or_else(|| today.month());
    let year = query.year.unwrap_or_else(|| today.year());

    if !(1..=12).contains(&month) {
        return Err(AppError::invalid("month must be between 1 and 12"));
    }

    Ok(HttpResponse::Ok().json(state.calendar.events(month, year).await))
}

/// Configure content routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/content")
            .route("/verse", web::get().to(get_verse))
            .route("/verse/daily", web::get().to(get_daily_verse))
            .route("/search", web::get().to(search))
            .route("/versions", web::get().to(versions))
            .route("/quote", web::get().to(get_quote))
            .route("/news", web::get().to(get_news))
            .route("/calendar", web::get().to(get_calendar)),
    );
}
