// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Correlation context propagated through every coordination call
//!
//! A context is an immutable value. Specializing it for a lock or a saga
//! produces a new context that keeps the original correlation id.

use crate::id::CorrelationId;
use std::future::Future;

tokio::task_local! {
    static AMBIENT: CoordinationContext;
}

/// Tracing identity for one logical operation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoordinationContext {
    correlation_id: CorrelationId,
    lock_key: Option<String>,
    saga_id: Option<String>,
}

impl CoordinationContext {
    /// Context with a freshly generated correlation id and no keys
    pub fn create() -> Self {
        Self::new(CorrelationId::generate())
    }

    /// Context continuing an existing correlation id (e.g. from a request header)
    ///
    /// An empty id is replaced with a generated one.
    pub fn new(correlation_id: CorrelationId) -> Self {
        let correlation_id = if correlation_id.is_empty() {
            CorrelationId::generate()
        } else {
            correlation_id
        };
        Self {
            correlation_id,
            lock_key: None,
            saga_id: None,
        }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub fn lock_key(&self) -> Option<&str> {
        self.lock_key.as_deref()
    }

    pub fn saga_id(&self) -> Option<&str> {
        self.saga_id.as_deref()
    }

    /// Derive a child context tagged with a lock key
    pub fn with_lock_key(&self, key: impl Into<String>) -> Self {
        Self {
            correlation_id: self.correlation_id.clone(),
            lock_key: Some(key.into()),
            saga_id: self.saga_id.clone(),
        }
    }

    /// Derive a child context tagged with a saga id
    pub fn with_saga_id(&self, saga_id: impl Into<String>) -> Self {
        Self {
            correlation_id: self.correlation_id.clone(),
            lock_key: self.lock_key.clone(),
            saga_id: Some(saga_id.into()),
        }
    }

    /// Run `fut` with this context installed as the ambient context
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        AMBIENT.scope(self, fut).await
    }

    /// The ambient context of the current task, if one was installed
    pub fn current() -> Option<Self> {
        AMBIENT.try_with(Clone::clone).ok()
    }

    /// The ambient context, or a fresh one when none is installed
    pub fn current_or_create() -> Self {
        Self::current().unwrap_or_else(Self::create)
    }
}

impl Default for CoordinationContext {
    fn default() -> Self {
        Self::create()
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
