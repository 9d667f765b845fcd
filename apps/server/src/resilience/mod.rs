//! Resilient fetch-cache shared by every content integration.
//!
//! Calls flow through three layers in order: the [`RateLimiter`] gates each
//! live upstream call, the [`FetchCache`] serves fresh values and falls back
//! to stale ones, and the [`FallbackChain`] tries upstream sources in a fixed
//! priority order. Static fallback content is applied by each domain service
//! once all three layers have failed.

pub mod cache;
pub mod fallback;
pub mod rate_limit;

use serde::Serialize;

pub use cache::{CacheEntry, CacheStats, FetchCache};
pub use fallback::{FallbackChain, Source};
pub use rate_limit::{RateLimiter, RateState};

// =============================================================================
// Fetch Errors
// =============================================================================

/// Broad category of an integration failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Status,
    Parse,
    NotConfigured,
    RateLimited,
    Exhausted,
}

/// Failure of a single upstream fetch (or of a whole chain)
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("{source_name}: request failed: {message}")]
    Transport {
        source_name: String,
        message: String,
    },

    #[error("{source_name}: HTTP {status}")]
    Status {
        source_name: String,
        status: u16,
        body: String,
    },

    #[error("{source_name}: unexpected response: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("{0}: not configured")]
    NotConfigured(String),

    #[error("{0}: rate limited")]
    RateLimited(String),

    #[error("all sources failed: {0}")]
    Exhausted(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Transport { .. } => ErrorKind::Transport,
            FetchError::Status { .. } => ErrorKind::Status,
            FetchError::Parse { .. } => ErrorKind::Parse,
            FetchError::NotConfigured(_) => ErrorKind::NotConfigured,
            FetchError::RateLimited(_) => ErrorKind::RateLimited,
            FetchError::Exhausted(_) => ErrorKind::Exhausted,
        }
    }

    pub fn parse(source_name: &str, message: impl Into<String>) -> Self {
        FetchError::Parse {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn transport(source_name: &str, message: impl Into<String>) -> Self {
        FetchError::Transport {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }
}

/// Result type returned uniformly by every integration
pub type FetchResult<T> = Result<T, FetchError>;

// =============================================================================
// Sourced Values
// =============================================================================

/// Where a served value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum Origin {
    /// Fetched just now from the named upstream source
    Live(String),
    /// Served from the cache inside its expiry window
    Cached,
    /// Served from an expired cache entry after a failed fetch
    Stale,
    /// Static content bundled with the server
    Fallback,
}

/// A value together with the layer that produced it
#[derive(Debug, Clone, Serialize)]
pub struct Sourced<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Sourced<T> {
    pub fn live(value: T, source_name: &str) -> Self {
        Self {
            value,
            origin: Origin::Live(source_name.to_string()),
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            origin: Origin::Fallback,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            value: f(self.value),
            origin: self.origin,
        }
    }
}
