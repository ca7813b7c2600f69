//! Cache configuration.
//!
//! Derived from the `[cache]` section of the settings file.

use std::{num::NonZeroUsize, time::Duration};

use super::keys::ResourceFamily;

const DEFAULT_CAPACITY: usize = 512;
const DEFAULT_PRODUCT_TTL: Duration = Duration::from_secs(10 * 60);
const DEFAULT_CATEGORY_TTL: Duration = Duration::from_secs(15 * 60);
const DEFAULT_VARIATION_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Serve and populate the per-family stores. When false every request goes upstream.
    pub enabled: bool,
    /// Maximum entries per store before the least recently used one is evicted.
    pub capacity: usize,
    pub product_ttl: Duration,
    pub category_ttl: Duration,
    pub variation_ttl: Duration,
    /// How long a server-side upstream failure is replayed. Zero disables failure caching.
    pub failure_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: DEFAULT_CAPACITY,
            product_ttl: DEFAULT_PRODUCT_TTL,
            category_ttl: DEFAULT_CATEGORY_TTL,
            variation_ttl: DEFAULT_VARIATION_TTL,
            failure_ttl: Duration::ZERO,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            capacity: settings.capacity.get(),
            product_ttl: settings.product_ttl,
            category_ttl: settings.category_ttl,
            variation_ttl: settings.variation_ttl,
            failure_ttl: settings.failure_ttl,
        }
    }
}

impl CacheConfig {
    pub fn ttl_for(&self, family: ResourceFamily) -> Duration {
        match family {
            ResourceFamily::Products => self.product_ttl,
            ResourceFamily::Categories => self.category_ttl,
            ResourceFamily::Variations => self.variation_ttl,
        }
    }

    /// Returns the capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.capacity).unwrap_or(NonZeroUsize::MIN)
    }
}
