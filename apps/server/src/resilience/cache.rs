use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;

use super::{FetchResult, Origin, Sourced};

/// Last successful value stored for a key
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub stored_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V) -> Self {
        Self {
            value,
            stored_at: Utc::now(),
        }
    }

    /// Whether the entry is still inside its expiry window
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => Utc::now() < self.stored_at + ttl,
            Err(_) => true,
        }
    }
}

/// Time-boxed cache with stale-on-error fallback.
///
/// Entries are overwritten on every successful fetch and never removed;
/// they expire logically by age. The map lock is released before the
/// producer runs, so concurrent misses for the same key may each call it.
pub struct FetchCache<V> {
    ttl: Duration,
    entries: DashMap<String, CacheEntry<V>>,
}

impl<V: Clone> FetchCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached value for `key` if fresh, otherwise runs `producer`.
    ///
    /// On producer failure the previous value (even expired) is returned with
    /// [`Origin::Stale`]; without a previous value the error propagates so the
    /// caller can substitute its static fallback.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, producer: F) -> FetchResult<Sourced<V>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = FetchResult<Sourced<V>>>,
    {
        let previous = self.entries.get(key).map(|entry| entry.clone());

        if let Some(ref entry) = previous {
            if entry.is_fresh(self.ttl) {
                log::debug!("Cache hit for key: {}", key);
                return Ok(Sourced {
                    value: entry.value.clone(),
                    origin: Origin::Cached,
                });
            }
        }

        log::debug!("Cache miss for key: {}", key);

        match producer().await {
            Ok(fetched) => {
                self.entries
                    .insert(key.to_string(), CacheEntry::new(fetched.value.clone()));
                Ok(fetched)
            }
            Err(e) => match previous {
                Some(entry) => {
                    log::warn!("Serving stale value for {} after error: {}", key, e);
                    Ok(Sourced {
                        value: entry.value,
                        origin: Origin::Stale,
                    })
                }
                None => Err(e),
            },
        }
    }

    /// Reads an entry regardless of age
    pub fn peek(&self, key: &str) -> Option<CacheEntry<V>> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    /// Stores a value directly, as a successful fetch would
    pub fn put(&self, key: &str, value: V) {
        self.entries.insert(key.to_string(), CacheEntry::new(value));
    }

    pub fn stats(&self) -> CacheStats {
        let total_entries = self.entries.len();
        let fresh_entries = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_fresh(self.ttl))
            .count();

        CacheStats {
            total_entries,
            fresh_entries,
            expired_entries: total_entries - fresh_entries,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub expired_entries: usize,
}
