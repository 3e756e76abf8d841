// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Coordination engine: locks, idempotency, and sagas over a shared store
//!
//! All coordination state lives in the injected [`coord_adapters::Store`];
//! nothing here caches lock, claim, or ledger state between calls.

mod cancel;
mod coordinator;
mod error;
mod idempotency;
mod keys;
mod lease;
mod lock;
mod saga;

pub use coordinator::Coordinator;
pub use error::{BoxError, CoordinationError, LeaseLoss};
pub use idempotency::{IdempotencyGuard, IdempotencyOutcome, IdempotencyRecord, RecordState};
pub use keys::KeySpace;
pub use lease::LockHandle;
pub use lock::{LockEntry, LockManager};
pub use saga::{SagaRunner, SagaSteps, StepOutcome};

pub use coord_core::{CoordinationContext, CorrelationId};
pub use tokio_util::sync::CancellationToken;
