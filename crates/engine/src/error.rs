// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for coordination calls
//!
//! Every variant names the key (or saga/step) it concerns and the
//! correlation id of the call, so a failure in the logs can be traced back
//! to the operation that produced it and safely retried.

use coord_adapters::StoreError;
use coord_core::CorrelationId;
use std::time::Duration;
use thiserror::Error;

/// Boxed failure returned by caller-supplied work
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a held lease stopped being ours
#[derive(Debug, Clone, Error)]
pub enum LeaseLoss {
    #[error("entry is no longer owned")]
    NotOwned,
    #[error("renewal failed: {0}")]
    RenewalFailed(StoreError),
    #[error("renewal task stopped unexpectedly")]
    RenewalAborted,
}

/// Errors surfaced by the lock manager, idempotency guard, and saga runner
#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("invalid {what}: must not be empty (correlation {correlation_id})")]
    InvalidKey {
        what: &'static str,
        correlation_id: CorrelationId,
    },
    #[error("invalid lease duration {ttl:?} for {key}: must be at least 1ms (correlation {correlation_id})")]
    InvalidLeaseDuration {
        key: String,
        ttl: Duration,
        correlation_id: CorrelationId,
    },
    #[error("lock {key} is held by another owner (correlation {correlation_id})")]
    LockContended {
        key: String,
        correlation_id: CorrelationId,
    },
    #[error("lock {key} was lost while work was running: {reason} (correlation {correlation_id})")]
    LockLost {
        key: String,
        reason: LeaseLoss,
        correlation_id: CorrelationId,
    },
    #[error("idempotency key {key} is already in flight (correlation {correlation_id})")]
    DuplicateInFlight {
        key: String,
        correlation_id: CorrelationId,
    },
    #[error("store unavailable during {operation} on {key} (correlation {correlation_id}): {source}")]
    StoreUnavailable {
        operation: &'static str,
        key: String,
        correlation_id: CorrelationId,
        #[source]
        source: StoreError,
    },
    #[error("saga {saga_id} step {step} failed (correlation {correlation_id}): {source}")]
    StepFailed {
        saga_id: String,
        step: String,
        correlation_id: CorrelationId,
        #[source]
        source: BoxError,
    },
    #[error("work under {key} failed (correlation {correlation_id}): {source}")]
    WorkFailed {
        key: String,
        correlation_id: CorrelationId,
        #[source]
        source: BoxError,
    },
    #[error("{key} cancelled (correlation {correlation_id})")]
    Cancelled {
        key: String,
        correlation_id: CorrelationId,
    },
    #[error("record at {key} is unreadable: {reason} (correlation {correlation_id})")]
    CorruptRecord {
        key: String,
        reason: String,
        correlation_id: CorrelationId,
    },
}

impl CoordinationError {
    pub(crate) fn store(
        operation: &'static str,
        key: &str,
        correlation_id: &CorrelationId,
        source: StoreError,
    ) -> Self {
        Self::StoreUnavailable {
            operation,
            key: key.to_string(),
            correlation_id: correlation_id.clone(),
            source,
        }
    }

    pub(crate) fn cancelled(key: &str, correlation_id: &CorrelationId) -> Self {
        Self::Cancelled {
            key: key.to_string(),
            correlation_id: correlation_id.clone(),
        }
    }

    /// Correlation id of the call that failed
    pub fn correlation_id(&self) -> &CorrelationId {
        match self {
            Self::InvalidKey { correlation_id, .. }
            | Self::InvalidLeaseDuration { correlation_id, .. }
            | Self::LockContended { correlation_id, .. }
            | Self::LockLost { correlation_id, .. }
            | Self::DuplicateInFlight { correlation_id, .. }
            | Self::StoreUnavailable { correlation_id, .. }
            | Self::StepFailed { correlation_id, .. }
            | Self::WorkFailed { correlation_id, .. }
            | Self::Cancelled { correlation_id, .. }
            | Self::CorruptRecord { correlation_id, .. } => correlation_id,
        }
    }

    /// True when another holder currently owns the key
    ///
    /// Callers typically back off and retry these.
    pub fn is_contention(&self) -> bool {
        matches!(
            self,
            Self::LockContended { .. } | Self::DuplicateInFlight { .. }
        )
    }

    /// True when retrying the same call later may succeed
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::LockContended { .. }
                | Self::DuplicateInFlight { .. }
                | Self::StoreUnavailable { .. }
                | Self::StepFailed { .. }
                | Self::LockLost { .. }
        )
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
