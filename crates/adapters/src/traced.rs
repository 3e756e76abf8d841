// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use crate::store::{Store, StoreError};
use async_trait::async_trait;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::Instrument;

/// Wrapper that adds tracing to any Store
#[derive(Clone)]
pub struct TracedStore<S> {
    inner: S,
}

impl<S> TracedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

/// Run one store call inside `span`, logging outcome and latency
async fn observe<T, F>(span: tracing::Span, fut: F) -> Result<T, StoreError>
where
    T: std::fmt::Debug,
    F: Future<Output = Result<T, StoreError>>,
{
    async move {
        let start = Instant::now();
        let result = fut.await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(reply) => tracing::debug!(elapsed_ms, reply = ?reply, "ok"),
            Err(e) => tracing::warn!(elapsed_ms, error = %e, "store call failed"),
        }

        result
    }
    .instrument(span)
    .await
}

#[async_trait]
impl<S: Store> Store for TracedStore<S> {
    async fn try_create(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("store.try_create", key, ttl_ms = ttl.as_millis() as u64);
        observe(span, self.inner.try_create(key, value, ttl)).await
    }

    async fn try_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("store.try_delete", key);
        observe(span, self.inner.try_delete(key, expected)).await
    }

    async fn refresh(&self, key: &str, expected: &str, ttl: Duration) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("store.refresh", key, ttl_ms = ttl.as_millis() as u64);
        observe(span, self.inner.refresh(key, expected, ttl)).await
    }

    async fn try_replace(
        &self,
        key: &str,
        expected: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("store.try_replace", key);
        observe(span, self.inner.try_replace(key, expected, value)).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let result = self.inner.get(key).await;
        // Values can be large records; log presence only
        match &result {
            Ok(value) => tracing::trace!(key, found = value.is_some(), "get"),
            Err(e) => tracing::warn!(key, error = %e, "get failed"),
        }
        result
    }

    async fn append_to_set(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let span = tracing::debug_span!("store.append_to_set", key, member);
        observe(span, self.inner.append_to_set(key, member)).await
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let result = self.inner.set_contains(key, member).await;
        match &result {
            Ok(contains) => tracing::trace!(key, member, contains, "checked"),
            Err(e) => tracing::warn!(key, member, error = %e, "set_contains failed"),
        }
        result
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let result = self.inner.set_members(key).await;
        tracing::trace!(key, count = result.as_ref().map(|m| m.len()).ok(), "listed members");
        if let Err(e) = &result {
            tracing::warn!(key, error = %e, "set_members failed");
        }
        result
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let span = tracing::debug_span!("store.remove", key);
        observe(span, self.inner.remove(key)).await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
