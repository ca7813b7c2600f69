//! Bounded TTL store for one resource family.

use std::{num::NonZeroUsize, sync::Arc, sync::RwLock, time::Duration};

use lru::LruCache;
use metrics::counter;
use time::OffsetDateTime;
use tracing::debug;

use super::{
    METRIC_CACHE_EVICT, METRIC_CACHE_FAILURE_HIT, METRIC_CACHE_HIT, METRIC_CACHE_MISS,
    clock::Clock,
    config::CacheConfig,
    keys::{CacheKey, ResourceFamily},
    lock::{rw_read, rw_write},
};

const SOURCE: &str = "cache::store";

/// A stored payload and the instant it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    pub key: String,
    pub payload: V,
    pub stored_at: OffsetDateTime,
}

/// Per-family cache store.
///
/// Holds at most one entry per key. Writes are unconditional overwrites, so
/// two concurrent misses on one key both land and the later write wins.
/// Entries are never mutated in place: a refresh replaces the whole entry.
///
/// Server-side upstream failures can be remembered in a separate slot for
/// `failure_ttl`. That slot is never visible through [`CacheStore::get`].
pub struct CacheStore<V> {
    family: ResourceFamily,
    ttl: Duration,
    failure_ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: RwLock<LruCache<String, CacheEntry<V>>>,
    failures: RwLock<LruCache<String, CacheEntry<V>>>,
}

impl<V: Clone> CacheStore<V> {
    pub fn new(
        family: ResourceFamily,
        ttl: Duration,
        capacity: NonZeroUsize,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            family,
            ttl,
            failure_ttl: Duration::ZERO,
            clock,
            entries: RwLock::new(LruCache::new(capacity)),
            failures: RwLock::new(LruCache::new(capacity)),
        }
    }

    pub fn from_config(family: ResourceFamily, config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            family,
            config.ttl_for(family),
            config.capacity_non_zero(),
            clock,
        )
        .with_failure_ttl(config.failure_ttl)
    }

    pub fn with_failure_ttl(mut self, failure_ttl: Duration) -> Self {
        self.failure_ttl = failure_ttl;
        self
    }

    /// `now - stored_at < ttl`. An entry stamped in the future counts as fresh.
    pub fn is_fresh(entry: &CacheEntry<V>, ttl: Duration, now: OffsetDateTime) -> bool {
        let elapsed = now - entry.stored_at;
        if elapsed.is_negative() {
            return true;
        }
        elapsed.unsigned_abs() < ttl
    }

    /// Raw lookup, regardless of freshness.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry<V>> {
        rw_write(&self.entries, SOURCE, "get")
            .get(key.as_str())
            .cloned()
    }

    /// Unconditional overwrite. Returns the key evicted to make room, if any.
    pub fn put(&self, key: &CacheKey, payload: V, stored_at: OffsetDateTime) -> Option<String> {
        let entry = CacheEntry {
            key: key.as_str().to_string(),
            payload,
            stored_at,
        };
        let evicted = rw_write(&self.entries, SOURCE, "put")
            .push(entry.key.clone(), entry)
            .map(|(evicted_key, _)| evicted_key)
            .filter(|evicted_key| evicted_key != key.as_str());

        if let Some(evicted_key) = evicted.as_deref() {
            debug!(family = %self.family, evicted = evicted_key, "cache entry evicted");
            counter!(METRIC_CACHE_EVICT, "family" => self.family.as_str()).increment(1);
        }
        evicted
    }

    /// Store a payload stamped with the current clock reading.
    pub fn store(&self, key: &CacheKey, payload: V) -> Option<String> {
        let now = self.clock.now();
        self.put(key, payload, now)
    }

    /// Lookup that treats entries older than the store TTL as absent.
    pub fn get_fresh(&self, key: &CacheKey) -> Option<CacheEntry<V>> {
        let now = self.clock.now();
        let fresh = self
            .get(key)
            .filter(|entry| Self::is_fresh(entry, self.ttl, now));

        let metric = if fresh.is_some() {
            METRIC_CACHE_HIT
        } else {
            METRIC_CACHE_MISS
        };
        counter!(metric, "family" => self.family.as_str()).increment(1);
        fresh
    }

    pub fn invalidate(&self, key: &CacheKey) {
        rw_write(&self.entries, SOURCE, "invalidate").pop(key.as_str());
    }

    /// Remember a failed fetch. No-op when failure caching is disabled.
    pub fn put_failure(&self, key: &CacheKey, payload: V) {
        if self.failure_ttl.is_zero() {
            return;
        }
        let entry = CacheEntry {
            key: key.as_str().to_string(),
            payload,
            stored_at: self.clock.now(),
        };
        rw_write(&self.failures, SOURCE, "put_failure").put(entry.key.clone(), entry);
    }

    /// A remembered failure younger than `failure_ttl`.
    pub fn get_fresh_failure(&self, key: &CacheKey) -> Option<CacheEntry<V>> {
        if self.failure_ttl.is_zero() {
            return None;
        }
        let now = self.clock.now();
        let mut failures = rw_write(&self.failures, SOURCE, "get_fresh_failure");
        match failures.get(key.as_str()).cloned() {
            Some(entry) if Self::is_fresh(&entry, self.failure_ttl, now) => {
                counter!(METRIC_CACHE_FAILURE_HIT, "family" => self.family.as_str()).increment(1);
                Some(entry)
            }
            Some(_) => {
                failures.pop(key.as_str());
                None
            }
            None => None,
        }
    }

    /// Forget a remembered failure, typically after a successful fetch.
    pub fn clear_failure(&self, key: &CacheKey) {
        if self.failure_ttl.is_zero() {
            return;
        }
        rw_write(&self.failures, SOURCE, "clear_failure").pop(key.as_str());
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
