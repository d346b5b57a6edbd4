//! Content-addressed storage for raw weather API responses.
//!
//! Entries are keyed by the endpoint plus the normalized query and carry the
//! [`CachePolicy`] they were stored under. Historical ranges that end before
//! today describe settled observations and never expire; everything else
//! (forecasts, ranges still touching today) expires after a time-to-live.

use crate::parameter::Mode;
use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

/// How long a cached response may be served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    Indefinite,
    ExpiresAfter(TimeDelta),
}

impl CachePolicy {
    /// Pick the policy for a request of `mode` whose data ends on `end_date`.
    pub fn for_request(mode: Mode, end_date: NaiveDate, today: NaiveDate, ttl: TimeDelta) -> Self {
        match mode {
            Mode::Historical if end_date < today => CachePolicy::Indefinite,
            _ => CachePolicy::ExpiresAfter(ttl),
        }
    }

    /// TTL in whole seconds, `None` for indefinite entries.
    pub fn ttl_seconds(&self) -> Option<i64> {
        match self {
            CachePolicy::Indefinite => None,
            CachePolicy::ExpiresAfter(ttl) => Some(ttl.num_seconds()),
        }
    }

    pub fn from_ttl_seconds(ttl_seconds: Option<i64>) -> Self {
        match ttl_seconds {
            None => CachePolicy::Indefinite,
            Some(seconds) => CachePolicy::ExpiresAfter(TimeDelta::seconds(seconds)),
        }
    }
}

/// Normalized identity of a request: `endpoint?key=value&...`.
///
/// Query pairs keep their order because the hourly variable list is
/// positional in the response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(endpoint: &str, query: &[(&str, String)]) -> Self {
        let normalized = query
            .iter()
            .map(|(k, v)| format!("{}={}", k.trim().to_lowercase(), v.trim()))
            .collect::<Vec<_>>()
            .join("&");
        CacheKey(format!("{}?{}", endpoint.trim_end_matches('/'), normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored response body with its storage time and policy.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResponse {
    pub body: String,
    pub stored_at: DateTime<Utc>,
    pub policy: CachePolicy,
}

impl CachedResponse {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.policy {
            CachePolicy::Indefinite => true,
            CachePolicy::ExpiresAfter(ttl) => now - self.stored_at < ttl,
        }
    }
}

/// Storage backend for API responses.
///
/// Freshness is judged by the caller via [`CachedResponse::is_fresh`]; stale
/// entries are simply overwritten by the next `put`.
pub trait ResponseCache {
    fn get(&self, key: &CacheKey) -> anyhow::Result<Option<CachedResponse>>;
    fn put(&self, key: &CacheKey, response: &CachedResponse) -> anyhow::Result<()>;
}

/// Process-local cache, one per session.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RefCell<HashMap<CacheKey, CachedResponse>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> anyhow::Result<Option<CachedResponse>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn put(&self, key: &CacheKey, response: &CachedResponse) -> anyhow::Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.clone(), response.clone());
        Ok(())
    }
}
