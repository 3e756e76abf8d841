// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Held leases and their background renewal

use crate::error::LeaseLoss;
use coord_adapters::Store;
use coord_core::{Clock, OwnerToken};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Shortest lease the engine accepts; stores expire at millisecond precision
pub(crate) const MIN_LEASE: Duration = Duration::from_millis(1);

/// Floor for the renewal period; `tokio::time::interval` rejects zero
const MIN_TICK: Duration = Duration::from_micros(100);

/// Proof of a held lock, passed to the guarded work
///
/// The handle shares one cancellation token with the renewal task. When the
/// lease is lost or the caller cancels, the token fires and the work should
/// stop touching lock-protected state.
#[derive(Debug, Clone)]
pub struct LockHandle {
    key: String,
    owner: OwnerToken,
    acquired_at: Instant,
    expires_at: Arc<Mutex<Instant>>,
    lease: CancellationToken,
}

impl LockHandle {
    pub(crate) fn new(
        key: &str,
        owner: OwnerToken,
        acquired_at: Instant,
        ttl: Duration,
        lease: CancellationToken,
    ) -> Self {
        Self {
            key: key.to_string(),
            owner,
            acquired_at,
            expires_at: Arc::new(Mutex::new(acquired_at + ttl)),
            lease,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn owner(&self) -> &OwnerToken {
        &self.owner
    }

    pub fn acquired_at(&self) -> Instant {
        self.acquired_at
    }

    /// Expiry as of the last successful renewal
    pub fn expires_at(&self) -> Instant {
        *self.expires_at.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_cancelled(&self) -> bool {
        self.lease.is_cancelled()
    }

    /// Resolves once the lease is lost or the caller cancels
    pub async fn cancelled(&self) {
        self.lease.cancelled().await
    }

    /// The shared lease token, for handing to sub-tasks
    pub fn token(&self) -> CancellationToken {
        self.lease.clone()
    }

    fn extend(&self, until: Instant) {
        *self.expires_at.lock().unwrap_or_else(|e| e.into_inner()) = until;
    }
}

/// Background task keeping a lease alive while work runs
pub(crate) struct Renewal<S, C> {
    pub store: S,
    pub clock: C,
    pub store_key: String,
    pub value: String,
    pub ttl: Duration,
    pub interval: Duration,
    pub handle: LockHandle,
}

impl<S: Store, C: Clock> Renewal<S, C> {
    /// Spawn the renewal loop
    ///
    /// The task ends when the lease token fires. It returns the reason the
    /// lease was lost, or `None` when it was stopped from outside.
    pub fn spawn(self) -> JoinHandle<Option<LeaseLoss>> {
        let span = tracing::debug_span!("lock.renew", key = %self.handle.key);
        tokio::spawn(self.run().instrument(span))
    }

    async fn run(self) -> Option<LeaseLoss> {
        let lease = self.handle.lease.clone();
        let mut ticks = tokio::time::interval(self.interval.max(MIN_TICK));
        ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; the lease is fresh
        ticks.tick().await;

        loop {
            tokio::select! {
                biased;
                _ = lease.cancelled() => return None,
                _ = ticks.tick() => {}
            }

            let refreshed = tokio::select! {
                biased;
                _ = lease.cancelled() => return None,
                r = self.store.refresh(&self.store_key, &self.value, self.ttl) => r,
            };

            let loss = match refreshed {
                Ok(true) => {
                    self.handle.extend(self.clock.deadline(self.ttl));
                    tracing::trace!("lease renewed");
                    continue;
                }
                Ok(false) => LeaseLoss::NotOwned,
                Err(e) => LeaseLoss::RenewalFailed(e),
            };

            tracing::warn!(reason = %loss, "lease lost, cancelling work");
            lease.cancel();
            return Some(loss);
        }
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
