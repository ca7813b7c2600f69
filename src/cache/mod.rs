//! In-process caches for upstream resource families.
//!
//! Each resource family (products, categories, variations) owns one
//! [`CacheStore`] with its own TTL. Stores are bounded LRU maps that read
//! time from an injected [`Clock`], so expiry is testable without sleeping.
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 512
//! product_ttl_seconds = 600
//! category_ttl_seconds = 900
//! variation_ttl_seconds = 600
//! failure_ttl_seconds = 0
//! ```

mod clock;
mod config;
mod headers;
mod keys;
mod lock;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use headers::{CacheStatus, X_CACHE, cache_control, no_store};
pub use keys::{CacheKey, ResourceFamily};
pub use store::{CacheEntry, CacheStore};

pub(crate) const METRIC_CACHE_HIT: &str = "storegate_cache_hit_total";
pub(crate) const METRIC_CACHE_MISS: &str = "storegate_cache_miss_total";
pub(crate) const METRIC_CACHE_EVICT: &str = "storegate_cache_evict_total";
pub(crate) const METRIC_CACHE_FAILURE_HIT: &str = "storegate_cache_failure_hit_total";
