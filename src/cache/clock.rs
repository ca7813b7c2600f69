use std::{sync::Mutex, time::Duration};

use time::OffsetDateTime;

use super::lock::mutex_lock;

/// Wall-clock source for cache freshness checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<OffsetDateTime>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = mutex_lock(&self.now, "cache::clock", "advance");
        *now += by;
    }

    pub fn set(&self, instant: OffsetDateTime) {
        *mutex_lock(&self.now, "cache::clock", "set") = instant;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(OffsetDateTime::UNIX_EPOCH)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *mutex_lock(&self.now, "cache::clock", "now")
    }
}
