// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Distributed lock manager
//!
//! A lock is a store entry created with set-if-absent and a TTL. The entry's
//! value identifies the holder, and both renewal and release compare against
//! it, so a holder can never extend or delete a lease someone else acquired
//! after its own expired.

use crate::cancel::until_cancelled;
use crate::error::{BoxError, CoordinationError, LeaseLoss};
use crate::keys::KeySpace;
use crate::lease::{LockHandle, Renewal, MIN_LEASE};
use coord_adapters::Store;
use coord_core::{
    Clock, CoordinationContext, CorrelationId, IdGen, LockSettings, OwnerToken, SystemClock,
    UuidIdGen,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Value stored under a held lock key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    pub owner: OwnerToken,
    pub correlation_id: CorrelationId,
}

/// Runs work under TTL leases held in the store
#[derive(Clone)]
pub struct LockManager<S, G = UuidIdGen, C = SystemClock> {
    store: S,
    keys: KeySpace,
    ids: G,
    clock: C,
    settings: LockSettings,
}

impl<S, G, C> LockManager<S, G, C>
where
    S: Store,
    G: IdGen,
    C: Clock,
{
    pub fn new(store: S, keys: KeySpace, ids: G, clock: C, settings: LockSettings) -> Self {
        Self {
            store,
            keys,
            ids,
            clock,
            settings,
        }
    }

    /// Run `work` while holding the lock on `key`
    ///
    /// Uses the ambient context (or a fresh one) and no external
    /// cancellation. See [`LockManager::run_with`].
    pub async fn run<F, Fut, T, E>(
        &self,
        key: &str,
        ttl: Duration,
        work: F,
    ) -> Result<T, CoordinationError>
    where
        F: FnOnce(LockHandle) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let ctx = CoordinationContext::current_or_create();
        self.run_with(&ctx, &CancellationToken::new(), key, ttl, work)
            .await
    }

    /// Run `work` while holding the lock on `key`
    ///
    /// Makes a single acquisition attempt; a held key fails with
    /// `LockContended`. While `work` runs the lease is refreshed in the
    /// background. If a refresh fails or finds the entry owned by someone
    /// else, the lease token fires, `work` is dropped, and the call fails
    /// with `LockLost`. Firing `cancel` does the same and fails with
    /// `Cancelled`. The entry is released on every exit path; a failed
    /// release is logged and left to expire.
    pub async fn run_with<F, Fut, T, E>(
        &self,
        ctx: &CoordinationContext,
        cancel: &CancellationToken,
        key: &str,
        ttl: Duration,
        work: F,
    ) -> Result<T, CoordinationError>
    where
        F: FnOnce(LockHandle) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let ctx = ctx.with_lock_key(key);
        let span = tracing::info_span!(
            "lock.run",
            key,
            correlation_id = %ctx.correlation_id(),
            saga_id = ctx.saga_id(),
            ttl_ms = ttl.as_millis() as u64,
        );
        self.locked(&ctx, cancel, key, ttl, work)
            .instrument(span)
            .await
    }

    async fn locked<F, Fut, T, E>(
        &self,
        ctx: &CoordinationContext,
        cancel: &CancellationToken,
        key: &str,
        ttl: Duration,
        work: F,
    ) -> Result<T, CoordinationError>
    where
        F: FnOnce(LockHandle) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let correlation_id = ctx.correlation_id();
        if key.is_empty() {
            return Err(CoordinationError::InvalidKey {
                what: "lock key",
                correlation_id: correlation_id.clone(),
            });
        }
        if ttl < MIN_LEASE {
            return Err(CoordinationError::InvalidLeaseDuration {
                key: key.to_string(),
                ttl,
                correlation_id: correlation_id.clone(),
            });
        }

        let store_key = self.keys.lock(key);
        let owner = self.ids.owner_token();
        let value = encode(key, correlation_id, &LockEntry {
            owner: owner.clone(),
            correlation_id: correlation_id.clone(),
        })?;

        // An acquire abandoned mid-flight is bounded by the TTL
        let acquired = until_cancelled(cancel, self.store.try_create(&store_key, &value, ttl))
            .await
            .ok_or_else(|| CoordinationError::cancelled(key, correlation_id))?
            .map_err(|e| CoordinationError::store("acquire", key, correlation_id, e))?;
        if !acquired {
            tracing::info!("lock contended");
            return Err(CoordinationError::LockContended {
                key: key.to_string(),
                correlation_id: correlation_id.clone(),
            });
        }

        let lease = cancel.child_token();
        // Stops renewal if this future is dropped or work panics
        let _stop_renewal = lease.clone().drop_guard();
        let handle = LockHandle::new(key, owner, self.clock.now(), ttl, lease.clone());
        tracing::info!(owner = %handle.owner(), "lock acquired");

        let renewal = Renewal {
            store: self.store.clone(),
            clock: self.clock.clone(),
            store_key: store_key.clone(),
            value: value.clone(),
            ttl,
            interval: self.settings.renewal_interval(ttl),
            handle: handle.clone(),
        }
        .spawn();

        let outcome = until_cancelled(&lease, work(handle)).await;

        lease.cancel();
        let loss = match renewal.await {
            Ok(loss) => loss,
            Err(e) => {
                tracing::warn!(error = %e, "renewal task failed");
                Some(LeaseLoss::RenewalAborted)
            }
        };

        self.release(&store_key, &value).await;

        if let Some(reason) = loss {
            tracing::warn!(%reason, "lock lost");
            return Err(CoordinationError::LockLost {
                key: key.to_string(),
                reason,
                correlation_id: correlation_id.clone(),
            });
        }

        match outcome {
            Some(Ok(value)) => Ok(value),
            Some(Err(e)) => {
                let source = e.into();
                tracing::info!(error = %source, "work failed under lock");
                Err(CoordinationError::WorkFailed {
                    key: key.to_string(),
                    correlation_id: correlation_id.clone(),
                    source,
                })
            }
            None => {
                tracing::info!("lock work cancelled");
                Err(CoordinationError::cancelled(key, correlation_id))
            }
        }
    }

    async fn release(&self, store_key: &str, value: &str) {
        match self.store.try_delete(store_key, value).await {
            Ok(true) => tracing::info!("lock released"),
            Ok(false) => tracing::warn!("lock entry already gone or re-acquired at release"),
            Err(e) => tracing::warn!(error = %e, "lock release failed, entry will expire"),
        }
    }

    /// Current holder of `key`, if any
    pub async fn inspect(&self, key: &str) -> Result<Option<LockEntry>, CoordinationError> {
        let ctx = CoordinationContext::current_or_create();
        let correlation_id = ctx.correlation_id();
        let store_key = self.keys.lock(key);
        let raw = self
            .store
            .get(&store_key)
            .await
            .map_err(|e| CoordinationError::store("inspect", key, correlation_id, e))?;

        raw.map(|raw| {
            serde_json::from_str(&raw).map_err(|e| CoordinationError::CorruptRecord {
                key: key.to_string(),
                reason: e.to_string(),
                correlation_id: correlation_id.clone(),
            })
        })
        .transpose()
    }
}

fn encode(
    key: &str,
    correlation_id: &CorrelationId,
    entry: &LockEntry,
) -> Result<String, CoordinationError> {
    serde_json::to_string(entry).map_err(|e| CoordinationError::CorruptRecord {
        key: key.to_string(),
        reason: e.to_string(),
        correlation_id: correlation_id.clone(),
    })
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
