// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{MemoryStore, Store, StoreError};
use async_trait::async_trait;
use coord_core::FakeClock;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Store operation kinds, for call recording and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Create,
    Delete,
    Refresh,
    Replace,
    Get,
    Append,
    Contains,
    Members,
    Remove,
}

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: StoreOp,
    pub key: String,
}

#[derive(Debug, Default)]
struct Faults {
    /// Every operation fails as if the store were unreachable
    unavailable: bool,
    /// Only these operations fail as unreachable
    failing: HashSet<StoreOp>,
    /// Refresh reports the entry as no longer owned
    reject_refresh: bool,
}

/// Memory store on a fake clock, with call recording and injectable faults
#[derive(Clone)]
pub struct FakeStore {
    inner: MemoryStore<FakeClock>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
    faults: Arc<Mutex<Faults>>,
}

impl Default for FakeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::with_clock(FakeClock::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
            faults: Arc::new(Mutex::new(Faults::default())),
        }
    }

    /// Clock driving TTL expiry in this store
    pub fn clock(&self) -> &FakeClock {
        self.inner.clock()
    }

    /// Underlying store, for inspection without recording calls
    pub fn memory(&self) -> &MemoryStore<FakeClock> {
        &self.inner
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of recorded calls of one kind
    pub fn count(&self, op: StoreOp) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|c| c.op == op)
            .count()
    }

    /// Make every operation fail with `StoreError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.faults.lock().unwrap_or_else(|e| e.into_inner()).unavailable = unavailable;
    }

    /// Make one kind of operation fail with `StoreError::Unavailable`
    pub fn fail_op(&self, op: StoreOp, failing: bool) {
        let mut faults = self.faults.lock().unwrap_or_else(|e| e.into_inner());
        if failing {
            faults.failing.insert(op);
        } else {
            faults.failing.remove(&op);
        }
    }

    /// Make refresh answer "not owned" without touching the entry
    pub fn reject_refresh(&self, reject: bool) {
        self.faults.lock().unwrap_or_else(|e| e.into_inner()).reject_refresh = reject;
    }

    /// Drop a key as if the store had evicted it
    pub async fn evict(&self, key: &str) -> bool {
        self.inner.remove(key).await.unwrap_or(false)
    }

    fn record(&self, op: StoreOp, key: &str) -> Result<(), StoreError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(StoreCall {
                op,
                key: key.to_string(),
            });

        let faults = self.faults.lock().unwrap_or_else(|e| e.into_inner());
        if faults.unavailable || faults.failing.contains(&op) {
            return Err(StoreError::Unavailable(format!("injected failure on {op:?}")));
        }
        Ok(())
    }

    fn refresh_rejected(&self) -> bool {
        self.faults
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .reject_refresh
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn try_create(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.record(StoreOp::Create, key)?;
        self.inner.try_create(key, value, ttl).await
    }

    async fn try_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError> {
        self.record(StoreOp::Delete, key)?;
        self.inner.try_delete(key, expected).await
    }

    async fn refresh(&self, key: &str, expected: &str, ttl: Duration) -> Result<bool, StoreError> {
        self.record(StoreOp::Refresh, key)?;
        if self.refresh_rejected() {
            return Ok(false);
        }
        self.inner.refresh(key, expected, ttl).await
    }

    async fn try_replace(
        &self,
        key: &str,
        expected: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        self.record(StoreOp::Replace, key)?;
        self.inner.try_replace(key, expected, value).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.record(StoreOp::Get, key)?;
        self.inner.get(key).await
    }

    async fn append_to_set(&self, key: &str, member: &str) -> Result<(), StoreError> {
        self.record(StoreOp::Append, key)?;
        self.inner.append_to_set(key, member).await
    }

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        self.record(StoreOp::Contains, key)?;
        self.inner.set_contains(key, member).await
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.record(StoreOp::Members, key)?;
        self.inner.set_members(key).await
    }

    async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        self.record(StoreOp::Remove, key)?;
        self.inner.remove(key).await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
