use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Per-API request bookkeeping
#[derive(Debug, Clone, Copy)]
pub struct RateState {
    pub last_request: Instant,
    pub request_count: u64,
}

/// Enforces a minimum spacing between calls to the same named API.
///
/// There is no queue and no retry: a disallowed call is skipped (or delayed,
/// see [`RateLimiter::acquire`]) by the caller. Two callers racing on the same
/// name may both be allowed; enforcement is approximate.
pub struct RateLimiter {
    min_interval: Duration,
    state: DashMap<String, RateState>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            state: DashMap::new(),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Returns whether a call to `api_name` may proceed now, recording it if so
    pub fn allow(&self, api_name: &str) -> bool {
        self.allow_at(api_name, Instant::now())
    }

    /// Same as [`RateLimiter::allow`] with an explicit current instant
    pub fn allow_at(&self, api_name: &str, now: Instant) -> bool {
        match self.state.entry(api_name.to_string()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if now.saturating_duration_since(entry.last_request) < self.min_interval {
                    log::debug!("Rate limited call to {}", api_name);
                    return false;
                }
                entry.last_request = now;
                entry.request_count += 1;
                true
            }
            Entry::Vacant(vacant) => {
                vacant.insert(RateState {
                    last_request: now,
                    request_count: 1,
                });
                true
            }
        }
    }

    /// Time left before `api_name` may be called again (zero if allowed now)
    pub fn remaining(&self, api_name: &str) -> Duration {
        self.state
            .get(api_name)
            .map(|entry| {
                self.min_interval
                    .saturating_sub(entry.last_request.elapsed())
            })
            .unwrap_or(Duration::ZERO)
    }

    /// Waits out the remaining spacing for `api_name`, then records the call
    pub async fn acquire(&self, api_name: &str) {
        loop {
            let wait = self.remaining(api_name);
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
            if self.allow(api_name) {
                return;
            }
        }
    }

    /// Number of calls allowed so far for `api_name`
    pub fn request_count(&self, api_name: &str) -> u64 {
        self.state
            .get(api_name)
            .map(|entry| entry.request_count)
            .unwrap_or(0)
    }

    pub fn state(&self, api_name: &str) -> Option<RateState> {
        self.state.get(api_name).map(|entry| *entry)
    }
}
