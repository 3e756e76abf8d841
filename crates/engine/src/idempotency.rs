// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idempotency guard
//!
//! Duplicate suppression lasts for the TTL of the record. Once the record
//! expires (or the store loses it) the same key runs its work again. This
//! is a practical dedup horizon, not an exactly-once guarantee.

use crate::cancel::until_cancelled;
use crate::error::{BoxError, CoordinationError};
use crate::keys::KeySpace;
use crate::lease::MIN_LEASE;
use chrono::{DateTime, Utc};
use coord_adapters::Store;
use coord_core::{Clock, CoordinationContext, CorrelationId, IdGen, OwnerToken, SystemClock, UuidIdGen};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Lifecycle of a claimed idempotency key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    InProgress,
    Completed,
}

/// Value stored under a claimed idempotency key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    pub state: RecordState,
    pub owner: OwnerToken,
    pub correlation_id: CorrelationId,
    pub claimed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl IdempotencyRecord {
    fn completed(&self, at: DateTime<Utc>) -> Self {
        Self {
            state: RecordState::Completed,
            completed_at: Some(at),
            ..self.clone()
        }
    }
}

/// Result of a guarded call
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum IdempotencyOutcome<T> {
    /// This call claimed the key and ran the work
    Executed(T),
    /// The key was already completed within its TTL; work did not run
    Suppressed,
}

impl<T> IdempotencyOutcome<T> {
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed(_))
    }

    pub fn is_suppressed(&self) -> bool {
        matches!(self, Self::Suppressed)
    }

    pub fn executed(self) -> Option<T> {
        match self {
            Self::Executed(value) => Some(value),
            Self::Suppressed => None,
        }
    }
}

/// Runs work at most once per key within the key's TTL
#[derive(Clone)]
pub struct IdempotencyGuard<S, G = UuidIdGen, C = SystemClock> {
    store: S,
    keys: KeySpace,
    ids: G,
    clock: C,
}

impl<S, G, C> IdempotencyGuard<S, G, C>
where
    S: Store,
    G: IdGen,
    C: Clock,
{
    pub fn new(store: S, keys: KeySpace, ids: G, clock: C) -> Self {
        Self {
            store,
            keys,
            ids,
            clock,
        }
    }

    /// Run `work` unless `key` was already claimed
    ///
    /// Uses the ambient context (or a fresh one). See
    /// [`IdempotencyGuard::run_with`].
    pub async fn run<F, Fut, T, E>(
        &self,
        key: &str,
        ttl: Duration,
        work: F,
    ) -> Result<IdempotencyOutcome<T>, CoordinationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let ctx = CoordinationContext::current_or_create();
        self.run_with(&ctx, &CancellationToken::new(), key, ttl, work)
            .await
    }

    /// Run `work` unless `key` was already claimed
    ///
    /// The first caller claims the key with an in-progress record and runs
    /// `work`. On success the record becomes completed and keeps its
    /// original expiry, so later calls return `Suppressed`. On failure or
    /// cancellation the claim is deleted and the key may be retried at once.
    /// A caller that finds the key still in progress gets
    /// `DuplicateInFlight` without waiting.
    pub async fn run_with<F, Fut, T, E>(
        &self,
        ctx: &CoordinationContext,
        cancel: &CancellationToken,
        key: &str,
        ttl: Duration,
        work: F,
    ) -> Result<IdempotencyOutcome<T>, CoordinationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let span = tracing::info_span!(
            "idempotency.run",
            key,
            correlation_id = %ctx.correlation_id(),
            saga_id = ctx.saga_id(),
            ttl_ms = ttl.as_millis() as u64,
        );
        self.guarded(ctx, cancel, key, ttl, work)
            .instrument(span)
            .await
    }

    async fn guarded<F, Fut, T, E>(
        &self,
        ctx: &CoordinationContext,
        cancel: &CancellationToken,
        key: &str,
        ttl: Duration,
        work: F,
    ) -> Result<IdempotencyOutcome<T>, CoordinationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<BoxError>,
    {
        let correlation_id = ctx.correlation_id();
        if key.is_empty() {
            return Err(CoordinationError::InvalidKey {
                what: "idempotency key",
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

        let store_key = self.keys.idempotency(key);
        let record = IdempotencyRecord {
            state: RecordState::InProgress,
            owner: self.ids.owner_token(),
            correlation_id: correlation_id.clone(),
            claimed_at: self.clock.wall(),
            completed_at: None,
        };
        let claim = encode(key, correlation_id, &record)?;

        let claimed = until_cancelled(cancel, self.store.try_create(&store_key, &claim, ttl))
            .await
            .ok_or_else(|| CoordinationError::cancelled(key, correlation_id))?
            .map_err(|e| CoordinationError::store("claim", key, correlation_id, e))?;
        if !claimed {
            return self.existing(ctx, cancel, key, &store_key).await;
        }
        tracing::info!(owner = %record.owner, "idempotency key claimed");

        match until_cancelled(cancel, work()).await {
            Some(Ok(value)) => {
                let done = encode(key, correlation_id, &record.completed(self.clock.wall()))?;
                let recorded = self
                    .store
                    .try_replace(&store_key, &claim, &done)
                    .await
                    .map_err(|e| CoordinationError::store("complete", key, correlation_id, e))?;
                if recorded {
                    tracing::info!("idempotent work completed");
                } else {
                    tracing::warn!("claim expired before completion was recorded, duplicates may run");
                }
                Ok(IdempotencyOutcome::Executed(value))
            }
            Some(Err(e)) => {
                let source = e.into();
                tracing::info!(error = %source, "idempotent work failed, releasing claim");
                self.abandon(&store_key, &claim).await;
                Err(CoordinationError::WorkFailed {
                    key: key.to_string(),
                    correlation_id: correlation_id.clone(),
                    source,
                })
            }
            None => {
                tracing::info!("idempotent work cancelled, releasing claim");
                self.abandon(&store_key, &claim).await;
                Err(CoordinationError::cancelled(key, correlation_id))
            }
        }
    }

    /// Decide what a losing claimant sees
    async fn existing<T>(
        &self,
        ctx: &CoordinationContext,
        cancel: &CancellationToken,
        key: &str,
        store_key: &str,
    ) -> Result<IdempotencyOutcome<T>, CoordinationError> {
        let correlation_id = ctx.correlation_id();
        let current = until_cancelled(cancel, self.store.get(store_key))
            .await
            .ok_or_else(|| CoordinationError::cancelled(key, correlation_id))?
            .map_err(|e| CoordinationError::store("read", key, correlation_id, e))?;

        let in_flight = || CoordinationError::DuplicateInFlight {
            key: key.to_string(),
            correlation_id: correlation_id.clone(),
        };

        let Some(raw) = current else {
            // Released or expired between our claim and this read
            tracing::info!("claim vanished, treating as in flight");
            return Err(in_flight());
        };

        let record = decode(key, correlation_id, &raw)?;
        match record.state {
            RecordState::Completed => {
                tracing::info!(first_correlation_id = %record.correlation_id, "duplicate suppressed");
                Ok(IdempotencyOutcome::Suppressed)
            }
            RecordState::InProgress => {
                tracing::info!(holder_correlation_id = %record.correlation_id, "duplicate in flight");
                Err(in_flight())
            }
        }
    }

    async fn abandon(&self, store_key: &str, claim: &str) {
        match self.store.try_delete(store_key, claim).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!("claim already gone when releasing"),
            Err(e) => tracing::warn!(error = %e, "claim release failed, key stays blocked until its ttl"),
        }
    }

    /// Current record for `key`, if any
    pub async fn status(&self, key: &str) -> Result<Option<IdempotencyRecord>, CoordinationError> {
        let ctx = CoordinationContext::current_or_create();
        let correlation_id = ctx.correlation_id();
        let raw = self
            .store
            .get(&self.keys.idempotency(key))
            .await
            .map_err(|e| CoordinationError::store("status", key, correlation_id, e))?;
        raw.map(|raw| decode(key, correlation_id, &raw)).transpose()
    }
}

fn encode(
    key: &str,
    correlation_id: &CorrelationId,
    record: &IdempotencyRecord,
) -> Result<String, CoordinationError> {
    serde_json::to_string(record).map_err(|e| CoordinationError::CorruptRecord {
        key: key.to_string(),
        reason: e.to_string(),
        correlation_id: correlation_id.clone(),
    })
}

fn decode(
    key: &str,
    correlation_id: &CorrelationId,
    raw: &str,
) -> Result<IdempotencyRecord, CoordinationError> {
    serde_json::from_str(raw).map_err(|e| CoordinationError::CorruptRecord {
        key: key.to_string(),
        reason: e.to_string(),
        correlation_id: correlation_id.clone(),
    })
}

#[cfg(test)]
#[path = "idempotency_tests.rs"]
mod tests;
