use async_trait::async_trait;
use std::sync::Arc;

use super::{FetchError, FetchResult, RateLimiter, Sourced};

/// One upstream provider of `T` for queries of type `Q`
#[async_trait]
pub trait Source<Q: Sync, T>: Send + Sync {
    /// Stable name used for logging, rate limiting and response origins
    fn name(&self) -> &'static str;

    /// Whether credentials are present; unconfigured sources are skipped
    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch(&self, query: &Q) -> FetchResult<T>;
}

/// Ordered list of sources tried one after another until one succeeds.
///
/// Each live call is gated by the shared [`RateLimiter`]; a source that is
/// rate limited or not configured is skipped like a failed one.
pub struct FallbackChain<Q: Sync, T> {
    sources: Vec<Arc<dyn Source<Q, T>>>,
    limiter: Arc<RateLimiter>,
}

impl<Q: Sync, T> FallbackChain<Q, T> {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self {
            sources: Vec::new(),
            limiter,
        }
    }

    pub fn with_source(mut self, source: Arc<dyn Source<Q, T>>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Returns the first successful value, tagged with the source that served it
    pub async fn resolve(&self, query: &Q) -> FetchResult<Sourced<T>> {
        let mut failures = Vec::new();

        for source in &self.sources {
            let name = source.name();

            if !source.is_configured() {
                log::debug!("Skipping {}: not configured", name);
                failures.push(FetchError::NotConfigured(name.to_string()));
                continue;
            }

            if !self.limiter.allow(name) {
                failures.push(FetchError::RateLimited(name.to_string()));
                continue;
            }

            match source.fetch(query).await {
                Ok(value) => return Ok(Sourced::live(value, name)),
                Err(e @ FetchError::NotConfigured(_)) => {
                    log::debug!("Skipping {}", e);
                    failures.push(e);
                }
                Err(e) => {
                    log::warn!("{}", e);
                    failures.push(e);
                }
            }
        }

        let summary = failures
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");

        Err(FetchError::Exhausted(if summary.is_empty() {
            "no sources configured".to_string()
        } else {
            summary
        }))
    }
}
