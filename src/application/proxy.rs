//! Read-through caching around one upstream fetch.

use std::{future::Future, time::Duration};

use tracing::debug;

use crate::cache::{CacheKey, CacheStatus, CacheStore};

use super::envelope::{Envelope, ProxyResponse};

/// Serve `key` from `store` while fresh, otherwise run `fetch`.
///
/// Successful envelopes are stored and overwrite whatever a concurrent miss
/// stored first. Client errors are returned and never remembered. Server
/// errors land in the store's failure slot, which is a no-op unless a failure
/// TTL is configured. With no store the fetch always runs and the response is
/// marked as a bypass.
pub async fn fetch_cached<F, Fut>(
    store: Option<&CacheStore<Envelope>>,
    ttl: Duration,
    key: &CacheKey,
    fetch: F,
) -> ProxyResponse
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Envelope>,
{
    let Some(store) = store else {
        return ProxyResponse::new(fetch().await, CacheStatus::Bypass, ttl);
    };

    if let Some(entry) = store.get_fresh(key) {
        debug!(key = %key, "cache hit");
        return ProxyResponse::new(entry.payload, CacheStatus::Hit, ttl);
    }
    if let Some(entry) = store.get_fresh_failure(key) {
        debug!(key = %key, "replaying remembered failure");
        return ProxyResponse::new(entry.payload, CacheStatus::Hit, Duration::ZERO);
    }

    let envelope = fetch().await;
    if envelope.is_success() {
        store.store(key, envelope.clone());
        store.clear_failure(key);
    } else if envelope.status().is_server_error() {
        store.put_failure(key, envelope.clone());
    }
    ProxyResponse::new(envelope, CacheStatus::Miss, ttl)
}
