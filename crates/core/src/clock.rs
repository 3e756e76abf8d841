// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for lease and TTL arithmetic
//!
//! Leases are measured on the monotonic clock; records written to the store
//! carry wall-clock timestamps so operators can read them.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A clock that provides monotonic and wall time
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;

    fn wall(&self) -> DateTime<Utc>;

    /// Instant at which a lease taken now for `ttl` runs out
    fn deadline(&self, ttl: Duration) -> Instant {
        self.now() + ttl
    }
}

/// Real system clock
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug)]
struct FakeTime {
    instant: Instant,
    wall: DateTime<Utc>,
}

/// Fake clock for testing with controllable time
///
/// Advancing moves the monotonic and wall readings together, so TTL expiry in
/// `MemoryStore` and timestamps in stored records stay consistent.
#[derive(Clone, Debug)]
pub struct FakeClock {
    current: Arc<Mutex<FakeTime>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(FakeTime {
                instant: Instant::now(),
                wall: Utc::now(),
            })),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        current.instant += duration;
        current.wall += chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).instant
    }

    fn wall(&self) -> DateTime<Utc> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).wall
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
