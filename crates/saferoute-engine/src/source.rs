//! Seams to the hazard store and to wall-clock time.

use chrono::{DateTime, Duration, Utc};
use saferoute_core::Hazard;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Supplier of the current normalized hazard list.
///
/// The engine only reads snapshots; it never writes back.
pub trait HazardSource: Send + Sync {
    fn snapshot(&self) -> Vec<Hazard>;
}

impl HazardSource for Vec<Hazard> {
    fn snapshot(&self) -> Vec<Hazard> {
        self.clone()
    }
}

/// Hazard list that an ingestion task can replace while requests read it.
#[derive(Debug, Default)]
pub struct SharedHazards {
    inner: RwLock<Arc<Vec<Hazard>>>,
}

impl SharedHazards {
    pub fn new(hazards: Vec<Hazard>) -> Self {
        Self {
            inner: RwLock::new(Arc::new(hazards)),
        }
    }

    pub fn replace(&self, hazards: Vec<Hazard>) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(hazards);
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HazardSource for SharedHazards {
    fn snapshot(&self) -> Vec<Hazard> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().clone()
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
