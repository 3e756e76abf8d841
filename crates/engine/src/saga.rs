// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resumable sagas over a forward-only step ledger
//!
//! The ledger is a store set of completed step names. A step runs only if
//! its name is absent from the set and is recorded only after its action
//! succeeds, so a rerun with the same saga id skips finished steps and
//! resumes at the first one that failed. There is no rollback: any
//! compensation is written by the caller as further steps.

use crate::cancel::until_cancelled;
use crate::error::{BoxError, CoordinationError};
use crate::keys::KeySpace;
use coord_adapters::Store;
use coord_core::CoordinationContext;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// What a step call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The action ran and the step is now recorded
    Executed,
    /// The step was recorded by an earlier run; the action did not run
    Skipped,
}

/// Runs saga bodies against the step ledger
#[derive(Clone)]
pub struct SagaRunner<S> {
    store: S,
    keys: KeySpace,
}

impl<S: Store> SagaRunner<S> {
    pub fn new(store: S, keys: KeySpace) -> Self {
        Self { store, keys }
    }

    /// Run `body` with a step executor bound to `saga_id`
    pub async fn run<F, Fut, T>(&self, saga_id: &str, body: F) -> Result<T, CoordinationError>
    where
        F: FnOnce(SagaSteps<S>) -> Fut,
        Fut: Future<Output = Result<T, CoordinationError>>,
    {
        let ctx = CoordinationContext::current_or_create();
        self.run_with(&ctx, &CancellationToken::new(), saga_id, body)
            .await
    }

    /// Run `body` with a step executor bound to `saga_id`
    ///
    /// A failure from any step propagates out of `body` unchanged, leaving
    /// the ledger as it was before that step. Cancellation stops the body at
    /// its next suspension point and records nothing for the running step.
    pub async fn run_with<F, Fut, T>(
        &self,
        ctx: &CoordinationContext,
        cancel: &CancellationToken,
        saga_id: &str,
        body: F,
    ) -> Result<T, CoordinationError>
    where
        F: FnOnce(SagaSteps<S>) -> Fut,
        Fut: Future<Output = Result<T, CoordinationError>>,
    {
        let ctx = ctx.with_saga_id(saga_id);
        let span = tracing::info_span!(
            "saga.run",
            saga_id,
            correlation_id = %ctx.correlation_id(),
        );

        async {
            if saga_id.is_empty() {
                return Err(CoordinationError::InvalidKey {
                    what: "saga id",
                    correlation_id: ctx.correlation_id().clone(),
                });
            }

            let steps = SagaSteps {
                store: self.store.clone(),
                saga_id: saga_id.to_string(),
                ledger: self.keys.saga_steps(saga_id),
                ctx: ctx.clone(),
                cancel: cancel.clone(),
            };

            tracing::info!("saga started");
            let result = until_cancelled(cancel, body(steps))
                .await
                .unwrap_or_else(|| Err(CoordinationError::cancelled(saga_id, ctx.correlation_id())));

            match &result {
                Ok(_) => tracing::info!("saga finished"),
                Err(e) => tracing::warn!(error = %e, "saga stopped, rerun to resume"),
            }
            result
        }
        .instrument(span)
        .await
    }

    /// Names of the steps recorded for `saga_id`, sorted
    pub async fn completed_steps(&self, saga_id: &str) -> Result<Vec<String>, CoordinationError> {
        let ctx = CoordinationContext::current_or_create();
        let mut steps = self
            .store
            .set_members(&self.keys.saga_steps(saga_id))
            .await
            .map_err(|e| CoordinationError::store("list steps", saga_id, ctx.correlation_id(), e))?;
        steps.sort();
        Ok(steps)
    }

    /// Drop the ledger for `saga_id` so its steps run again
    ///
    /// Returns whether a ledger existed.
    pub async fn forget(&self, saga_id: &str) -> Result<bool, CoordinationError> {
        let ctx = CoordinationContext::current_or_create();
        let removed = self
            .store
            .remove(&self.keys.saga_steps(saga_id))
            .await
            .map_err(|e| CoordinationError::store("forget", saga_id, ctx.correlation_id(), e))?;
        tracing::info!(saga_id, correlation_id = %ctx.correlation_id(), removed, "saga ledger forgotten");
        Ok(removed)
    }
}

/// Step executor handed to a saga body
#[derive(Clone)]
pub struct SagaSteps<S> {
    store: S,
    saga_id: String,
    ledger: String,
    ctx: CoordinationContext,
    cancel: CancellationToken,
}

impl<S: Store> SagaSteps<S> {
    pub fn saga_id(&self) -> &str {
        &self.saga_id
    }

    pub fn context(&self) -> &CoordinationContext {
        &self.ctx
    }

    /// Run `action` unless step `name` is already recorded
    ///
    /// The step is recorded only after `action` succeeds. Recording an
    /// already-present name is a no-op.
    pub async fn step<F, Fut, E>(&self, name: &str, action: F) -> Result<StepOutcome, CoordinationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Into<BoxError>,
    {
        let span = tracing::info_span!(
            "saga.step",
            saga_id = %self.saga_id,
            step = name,
            correlation_id = %self.ctx.correlation_id(),
        );
        self.execute(name, action).instrument(span).await
    }

    async fn execute<F, Fut, E>(&self, name: &str, action: F) -> Result<StepOutcome, CoordinationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: Into<BoxError>,
    {
        let correlation_id = self.ctx.correlation_id();
        if name.is_empty() {
            return Err(CoordinationError::InvalidKey {
                what: "step name",
                correlation_id: correlation_id.clone(),
            });
        }

        let step_key = format!("{}/{}", self.saga_id, name);
        if self.is_completed(name).await? {
            tracing::debug!("step already completed, skipping");
            return Ok(StepOutcome::Skipped);
        }

        match until_cancelled(&self.cancel, action()).await {
            None => {
                tracing::info!("step cancelled");
                Err(CoordinationError::cancelled(&step_key, correlation_id))
            }
            Some(Err(e)) => {
                let source = e.into();
                tracing::warn!(error = %source, "step failed");
                Err(CoordinationError::StepFailed {
                    saga_id: self.saga_id.clone(),
                    step: name.to_string(),
                    correlation_id: correlation_id.clone(),
                    source,
                })
            }
            Some(Ok(())) => {
                self.store
                    .append_to_set(&self.ledger, name)
                    .await
                    .map_err(|e| CoordinationError::store("record step", &step_key, correlation_id, e))?;
                tracing::info!("step completed");
                Ok(StepOutcome::Executed)
            }
        }
    }

    /// Whether step `name` is recorded for this saga
    pub async fn is_completed(&self, name: &str) -> Result<bool, CoordinationError> {
        let correlation_id = self.ctx.correlation_id();
        let step_key = format!("{}/{}", self.saga_id, name);
        until_cancelled(&self.cancel, self.store.set_contains(&self.ledger, name))
            .await
            .ok_or_else(|| CoordinationError::cancelled(&step_key, correlation_id))?
            .map_err(|e| CoordinationError::store("check step", &step_key, correlation_id, e))
    }
}

#[cfg(test)]
#[path = "saga_tests.rs"]
mod tests;
