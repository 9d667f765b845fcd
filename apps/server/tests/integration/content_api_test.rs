//! Integration tests for the content API
//!
//! Every upstream is a fake server; responses always come back 200 with a
//! `{value, origin}` body, whichever layer produced the value.

use crate::common::{session_key, test_config, test_state, FakeUpstream};
use actix_web::{test, App};
use fellowship::integrations::quotes::fallback_quotes;
use fellowship::store::LocalStore;
use fellowship::{routes, session_middleware};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

/// Builds the full app with every upstream pointed at `upstream`
macro_rules! init_app {
    ($upstream:expr, $dir:expr) => {{
        let config = test_config(&$upstream.url(), $dir.path());
        let store = LocalStore::open($dir.path()).await.unwrap();
        let state = test_state(&config, Arc::new(store));
        test::init_service(
            App::new()
                .app_data(state)
                .wrap(session_middleware(session_key(), false))
                .configure(routes::configure),
        )
        .await
    }};
}

fn feed_body(count: usize) -> Value {
    let items: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "title": format!("Article {}", i),
                "description": "Church news",
                "link": format!("https://news.example/{}", i),
                "pubDate": "2025-06-01 10:00:00"
            })
        })
        .collect();
    json!({ "status": "ok", "items": items })
}

// =============================================================================
// Verses
// =============================================================================

#[actix_web::test]
async fn test_verse_requires_reference() {
    let upstream = FakeUpstream::failing();
    let dir = TempDir::new().unwrap();
    let app = init_app!(upstream, dir);

    let req = test::TestRequest::get()
        .uri("/api/content/verse")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "ValidationError");
    assert_eq!(upstream.hits(), 0);
}

#[actix_web::test]
async fn test_verse_falls_back_when_upstreams_fail() {
    let upstream = FakeUpstream::failing();
    let dir = TempDir::new().unwrap();
    let app = init_app!(upstream, dir);

    let req = test::TestRequest::get()
        .uri("/api/content/verse?reference=John%203:16")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["origin"], json!({ "kind": "fallback" }));
    assert_eq!(body["value"]["reference"], "John 3:16");
    assert_eq!(body["value"]["translation"], "Fallback");
}

#[actix_web::test]
async fn test_daily_verse_for_date() {
    let upstream = FakeUpstream::failing();
    let dir = TempDir::new().unwrap();
    let app = init_app!(upstream, dir);

    let uri = "/api/content/verse/daily?date=2025-03-01";
    let first: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri(uri).to_request(),
    )
    .await;
    let second: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri(uri).to_request(),
    )
    .await;

    assert_eq!(first["value"]["reference"], second["value"]["reference"]);
}

#[actix_web::test]
async fn test_search_requires_query() {
    let upstream = FakeUpstream::failing();
    let dir = TempDir::new().unwrap();
    let app = init_app!(upstream, dir);

    let req = test::TestRequest::get()
        .uri("/api/content/search?q=%20")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn test_versions_lists_translations() {
    let upstream = FakeUpstream::failing();
    let dir = TempDir::new().unwrap();
    let app = init_app!(upstream, dir);

    let req = test::TestRequest::get()
        .uri("/api/content/versions")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["default"], "ESV");
    assert_eq!(body["versions"].as_array().unwrap().len(), 10);
    assert_eq!(body["versions"][0]["abbreviation"], "ESV");
}

// =============================================================================
// Quotes
// =============================================================================

#[actix_web::test]
async fn test_quote_from_quotable() {
    let upstream = FakeUpstream::respond(
        200,
        json!({
            "content": "Be still, and know.",
            "author": "A. Believer",
            "tags": ["faith"]
        }),
    );
    let dir = TempDir::new().unwrap();
    let app = init_app!(upstream, dir);

    let req = test::TestRequest::get().uri("/api/content/quote").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["value"]["quote"], "Be still, and know.");
    assert_eq!(body["origin"], json!({ "kind": "live", "name": "quotable" }));

    let request = upstream.last_request().unwrap();
    assert_eq!(request.path, "/quotes/random");
    assert!(request.query.contains("maxLength=150"));
}

#[actix_web::test]
async fn test_quote_falls_back_to_bundled_quotes() {
    let upstream = FakeUpstream::failing();
    let dir = TempDir::new().unwrap();
    let app = init_app!(upstream, dir);

    let req = test::TestRequest::get().uri("/api/content/quote").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let bundled: Vec<String> = fallback_quotes().into_iter().map(|q| q.quote).collect();
    assert_eq!(body["origin"]["kind"], "fallback");
    assert!(bundled.contains(&body["value"]["quote"].as_str().unwrap().to_string()));
}

// =============================================================================
// News
// =============================================================================

#[actix_web::test]
async fn test_news_splits_limit_across_feeds() {
    let upstream = FakeUpstream::respond(200, feed_body(10));
    let dir = TempDir::new().unwrap();
    let app = init_app!(upstream, dir);

    let req = test::TestRequest::get()
        .uri("/api/content/news?limit=5")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    // ceil(5 / 2) = 3 per feed, 6 total, cut back to 5
    let articles = body["value"].as_array().unwrap();
    assert_eq!(articles.len(), 5);
    assert_eq!(articles[0]["source"], "www.christianpost.com");
    assert_eq!(articles[3]["source"], "www.crosswalk.com");
    assert_eq!(upstream.hits(), 2);

    let request = upstream.last_request().unwrap();
    assert_eq!(request.path, "/v1/api.json");
    assert!(request.query.starts_with("rss_url="));
}

#[actix_web::test]
async fn test_news_falls_back_when_feeds_fail() {
    let upstream = FakeUpstream::respond(200, json!({ "status": "error", "message": "bad feed" }));
    let dir = TempDir::new().unwrap();
    let app = init_app!(upstream, dir);

    let req = test::TestRequest::get().uri("/api/content/news").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["origin"]["kind"], "fallback");
    assert_eq!(body["value"].as_array().unwrap().len(), 2);
}

// =============================================================================
// Calendar
// =============================================================================

#[actix_web::test]
async fn test_calendar_month() {
    let upstream = FakeUpstream::failing();
    let dir = TempDir::new().unwrap();
    let app = init_app!(upstream, dir);

    let req = test::TestRequest::get()
        .uri("/api/content/calendar?month=12&year=2025")
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(
        body["value"],
        json!([
            {
                "date": "12-24",
                "name": "Christmas Eve",
                "description": "Vigil and preparation for Christmas"
            },
            {
                "date": "12-25",
                "name": "Christmas Day",
                "description": "Celebration of the birth of Jesus Christ"
            }
        ])
    );
}

#[actix_web::test]
async fn test_calendar_rejects_invalid_month() {
    let upstream = FakeUpstream::failing();
    let dir = TempDir::new().unwrap();
    let app = init_app!(upstream, dir);

    let req = test::TestRequest::get()
        .uri("/api/content/calendar?month=13")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
}
