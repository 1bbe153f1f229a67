//! Minimum-interval spacing for outbound provider calls.
//!
//! Holds its last-call timestamp as plain state so callers (and tests) can
//! drive it from any [`Clock`](crate::source::Clock). It only ever delays a
//! call; it never retries one.

use chrono::{DateTime, Utc};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug)]
pub struct CallThrottle {
    min_interval: Duration,
    last_call: Mutex<Option<DateTime<Utc>>>,
}

impl CallThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Claim the next call slot at `now` and return how long to wait for it.
    pub fn reserve(&self, now: DateTime<Utc>) -> Duration {
        let mut last = self.last_call.lock().unwrap_or_else(PoisonError::into_inner);
        let interval = chrono::Duration::from_std(self.min_interval)
            .unwrap_or_else(|_| chrono::Duration::zero());

        let slot = match *last {
            Some(previous) if interval > chrono::Duration::zero() => previous
                .checked_add_signed(interval)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
                .max(now),
            _ => now,
        };
        *last = Some(slot);

        (slot - now).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn last_call(&self) -> Option<DateTime<Utc>> {
        *self.last_call.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
