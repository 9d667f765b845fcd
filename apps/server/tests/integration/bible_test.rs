//! Integration tests for the Bible source chain
//!
//! Each source points at its own fake upstream so the fallback order can be
//! observed from the outside.

use crate::common::{test_config, FakeUpstream, FAST_INTERVAL};
use fellowship::config::IntegrationsConfig;
use fellowship::integrations::bible::{bible_id, BibleService, FALLBACK_TRANSLATION, JOHN_3_16};
use fellowship::integrations::build_http_client;
use fellowship::resilience::{Origin, RateLimiter};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

struct Upstreams {
    scripture: FakeUpstream,
    bible_org: FakeUpstream,
    open_bible: FakeUpstream,
}

impl Upstreams {
    fn all_failing() -> Self {
        Self {
            scripture: FakeUpstream::failing(),
            bible_org: FakeUpstream::failing(),
            open_bible: FakeUpstream::failing(),
        }
    }

    fn config(&self) -> IntegrationsConfig {
        let mut config = test_config(&self.scripture.url(), Path::new("unused")).integrations;
        config.bible_org_url = self.bible_org.url();
        config.open_bible_url = self.open_bible.url();
        config
    }

    fn hits(&self) -> (usize, usize, usize) {
        (
            self.scripture.hits(),
            self.bible_org.hits(),
            self.open_bible.hits(),
        )
    }
}

fn service(config: &IntegrationsConfig) -> BibleService {
    let http = build_http_client(Duration::from_secs(5)).unwrap();
    let limiter = Arc::new(RateLimiter::new(FAST_INTERVAL));
    BibleService::new(config, http, limiter, Duration::from_secs(60))
}

fn scripture_body(content: &str) -> serde_json::Value {
    json!({
        "data": {
            "passages": [{ "reference": "John 3:16", "content": content }]
        }
    })
}

// =============================================================================
// Verse lookup
// =============================================================================

#[actix_web::test]
async fn test_all_sources_failing_serves_bundled_verse() {
    let upstreams = Upstreams::all_failing();
    let bible = service(&upstreams.config());

    let verse = bible.verse("John 3:16", None).await;

    assert_eq!(verse.origin, Origin::Fallback);
    assert_eq!(verse.value.content, JOHN_3_16);
    assert_eq!(verse.value.reference, "John 3:16");
    assert_eq!(verse.value.translation, FALLBACK_TRANSLATION);
    assert_eq!(upstreams.hits(), (1, 1, 1));
}

#[actix_web::test]
async fn test_unknown_reference_falls_back_to_john_3_16() {
    let upstreams = Upstreams::all_failing();
    let bible = service(&upstreams.config());

    let verse = bible.verse("Obadiah 1:99", None).await;

    assert_eq!(verse.value.content, JOHN_3_16);
    assert_eq!(verse.value.reference, "Obadiah 1:99");
}

#[actix_web::test]
async fn test_scripture_api_serves_first_and_strips_markup() {
    let upstreams = Upstreams {
        scripture: FakeUpstream::respond(
            200,
            scripture_body("<p class=\"p\"><span>16</span>For God so   loved the world</p>"),
        ),
        bible_org: FakeUpstream::failing(),
        open_bible: FakeUpstream::failing(),
    };
    let bible = service(&upstreams.config());

    let verse = bible.verse("John 3:16", Some("kjv")).await;

    assert_eq!(verse.origin, Origin::Live("scripture_api".to_string()));
    assert_eq!(verse.value.content, "16For God so loved the world");
    assert_eq!(verse.value.translation, "KJV");
    assert_eq!(upstreams.hits(), (1, 0, 0));

    let request = upstreams.scripture.last_request().unwrap();
    assert_eq!(request.path, format!("/bibles/{}/search", bible_id("KJV")));
    assert_eq!(request.api_key.as_deref(), Some("test-scripture-key"));
    assert!(request.query.contains("query=John"));
}

#[actix_web::test]
async fn test_bible_org_used_when_scripture_api_fails() {
    let upstreams = Upstreams {
        scripture: FakeUpstream::failing(),
        bible_org: FakeUpstream::respond(
            200,
            json!({ "response": { "passages": [{ "text": "Jesus wept." }] } }),
        ),
        open_bible: FakeUpstream::failing(),
    };
    let bible = service(&upstreams.config());

    let verse = bible.verse("John 11:35", None).await;

    assert_eq!(verse.origin, Origin::Live("bible_org".to_string()));
    assert_eq!(verse.value.content, "Jesus wept.");
    assert_eq!(verse.value.translation, "ESV");
    assert_eq!(upstreams.hits(), (1, 1, 0));

    let request = upstreams.bible_org.last_request().unwrap();
    assert_eq!(request.path, "/passages.js");
    assert!(request.query.contains("formatting=plain"));
}

#[actix_web::test]
async fn test_open_bible_is_last_and_labelled_kjv() {
    let upstreams = Upstreams {
        scripture: FakeUpstream::failing(),
        bible_org: FakeUpstream::failing(),
        open_bible: FakeUpstream::respond(
            200,
            json!([
                { "text": "In the beginning was the Word," },
                { "text": "and the Word was with God." }
            ]),
        ),
    };
    let bible = service(&upstreams.config());

    let verse = bible.verse("John 1:1", Some("ESV")).await;

    assert_eq!(verse.origin, Origin::Live("open_bible".to_string()));
    assert_eq!(
        verse.value.content,
        "In the beginning was the Word, and the Word was with God."
    );
    assert_eq!(verse.value.translation, "KJV");
}

#[actix_web::test]
async fn test_missing_key_skips_scripture_api() {
    let upstreams = Upstreams {
        scripture: FakeUpstream::respond(200, scripture_body("unused")),
        bible_org: FakeUpstream::respond(
            200,
            json!({ "response": { "passages": [{ "text": "The Lord is my shepherd." }] } }),
        ),
        open_bible: FakeUpstream::failing(),
    };
    let mut config = upstreams.config();
    config.scripture_api_key = None;
    let bible = service(&config);

    let verse = bible.verse("Psalm 23:1", None).await;

    assert_eq!(verse.origin, Origin::Live("bible_org".to_string()));
    assert_eq!(upstreams.scripture.hits(), 0);
}

#[actix_web::test]
async fn test_repeat_lookup_is_served_from_cache() {
    let upstreams = Upstreams {
        scripture: FakeUpstream::respond(200, scripture_body("For God so loved the world")),
        bible_org: FakeUpstream::failing(),
        open_bible: FakeUpstream::failing(),
    };
    let bible = service(&upstreams.config());

    let first = bible.verse("John 3:16", None).await;
    let second = bible.verse("John 3:16", None).await;

    assert_eq!(first.origin, Origin::Live("scripture_api".to_string()));
    assert_eq!(second.origin, Origin::Cached);
    assert_eq!(first.value, second.value);
    assert_eq!(upstreams.scripture.hits(), 1);
}

// =============================================================================
// Search
// =============================================================================

#[actix_web::test]
async fn test_search_failure_returns_empty_list() {
    let upstreams = Upstreams::all_failing();
    let bible = service(&upstreams.config());

    let results = bible.search("grace", None).await;

    assert_eq!(results.origin, Origin::Fallback);
    assert!(results.value.is_empty());
    // Search only uses the Scripture API
    assert_eq!(upstreams.hits(), (1, 0, 0));
}

#[actix_web::test]
async fn test_search_limit_is_clamped() {
    let upstreams = Upstreams {
        scripture: FakeUpstream::respond(
            200,
            json!({
                "data": {
                    "passages": [
                        { "reference": "Ephesians 2:8", "content": "<p>For by grace</p>" },
                        { "reference": "Romans 3:24", "content": "<p>justified by his grace</p>" }
                    ]
                }
            }),
        ),
        bible_org: FakeUpstream::failing(),
        open_bible: FakeUpstream::failing(),
    };
    let bible = service(&upstreams.config());

    let results = bible.search("grace", Some(500)).await;

    assert_eq!(results.value.len(), 2);
    assert_eq!(results.value[0].reference, "Ephesians 2:8");
    assert_eq!(results.value[0].content, "For by grace");

    let request = upstreams.scripture.last_request().unwrap();
    assert!(request.query.contains("limit=50"));
}
