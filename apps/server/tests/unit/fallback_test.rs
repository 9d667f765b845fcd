//! Unit tests for ordered source fallback

use crate::common::{StubSource, FAST_INTERVAL};
use fellowship::resilience::{FallbackChain, FetchError, Origin, RateLimiter};
use pretty_assertions::assert_eq;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

fn limiter() -> Arc<RateLimiter> {
    Arc::new(RateLimiter::new(FAST_INTERVAL))
}

#[tokio::test]
async fn test_first_success_wins_in_order() {
    let primary = StubSource::failing("scripture_api");
    let secondary = StubSource::ok("bible_org", "from bible.org".to_string());
    let tertiary = StubSource::ok("open_bible", "from open bible".to_string());
    let tertiary_calls = tertiary.calls();
    let primary_calls = primary.calls();

    let chain = FallbackChain::<(), String>::new(limiter())
        .with_source(Arc::new(primary))
        .with_source(Arc::new(secondary))
        .with_source(Arc::new(tertiary));

    let resolved = chain.resolve(&()).await.unwrap();

    assert_eq!(resolved.value, "from bible.org");
    assert_eq!(resolved.origin, Origin::Live("bible_org".to_string()));
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(tertiary_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unconfigured_source_is_skipped_without_call() {
    let unconfigured = StubSource::ok("scripture_api", 1u32).unconfigured();
    let calls = unconfigured.calls();

    let chain = FallbackChain::<(), u32>::new(limiter())
        .with_source(Arc::new(unconfigured))
        .with_source(Arc::new(StubSource::ok("bible_org", 2u32)));

    let resolved = chain.resolve(&()).await.unwrap();

    assert_eq!(resolved.value, 2);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rate_limited_source_is_skipped() {
    let limiter = Arc::new(RateLimiter::new(Duration::from_secs(60)));
    // Use up the window for the first source
    assert!(limiter.allow("scripture_api"));

    let limited = StubSource::ok("scripture_api", "limited");
    let calls = limited.calls();

    let chain = FallbackChain::<(), &str>::new(limiter)
        .with_source(Arc::new(limited))
        .with_source(Arc::new(StubSource::ok("bible_org", "open")));

    let resolved = chain.resolve(&()).await.unwrap();

    assert_eq!(resolved.value, "open");
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_all_failing_is_exhausted() {
    let chain = FallbackChain::<(), String>::new(limiter())
        .with_source(Arc::new(StubSource::failing("scripture_api")))
        .with_source(Arc::new(StubSource::failing("bible_org")));

    match chain.resolve(&()).await {
        Err(FetchError::Exhausted(summary)) => {
            assert!(summary.contains("scripture_api"));
            assert!(summary.contains("bible_org"));
        }
        other => panic!("Expected exhausted chain, got {:?}", other.map(|s| s.value)),
    }
}

#[tokio::test]
async fn test_empty_chain_reports_no_sources() {
    let chain = FallbackChain::<(), String>::new(limiter());

    let err = chain.resolve(&()).await.unwrap_err();
    assert_eq!(err.to_string(), "all sources failed: no sources configured");
}
