//! Response header policy for cached routes.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue};

pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// How a response relates to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    /// Caching is disabled for this family.
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Bypass => "BYPASS",
        }
    }

    pub fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(self.as_str())
    }
}

/// `public, s-maxage=<ttl>, stale-while-revalidate=<2 * ttl>`.
pub fn cache_control(ttl: Duration) -> HeaderValue {
    let seconds = ttl.as_secs();
    let value = format!(
        "public, s-maxage={seconds}, stale-while-revalidate={}",
        seconds.saturating_mul(2)
    );
    HeaderValue::from_str(&value).unwrap_or_else(|_| no_store())
}

pub fn no_store() -> HeaderValue {
    HeaderValue::from_static("no-store")
}
