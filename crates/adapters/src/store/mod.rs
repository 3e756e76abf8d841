// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key-value store adapters
//!
//! Every operation is a single atomic step on the store. Conditional
//! operations compare against the exact stored value.

mod memory;
mod redis_store;

pub use memory::MemoryStore;
pub use redis_store::RedisStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeStore, StoreCall, StoreOp};

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from store operations
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("store rejected command: {0}")]
    Command(String),
    #[error("key holds a value of the wrong kind: {0}")]
    WrongType(String),
}

/// Atomic operations the coordination engine needs from a store
#[async_trait]
pub trait Store: Clone + Send + Sync + 'static {
    /// Create `key` with `value` expiring after `ttl`, only if absent
    async fn try_create(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Delete `key` only if it currently holds `expected`
    async fn try_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError>;

    /// Reset the expiry of `key` to `ttl` only if it currently holds `expected`
    async fn refresh(&self, key: &str, expected: &str, ttl: Duration) -> Result<bool, StoreError>;

    /// Swap `expected` for `value`, keeping the remaining expiry
    async fn try_replace(&self, key: &str, expected: &str, value: &str)
        -> Result<bool, StoreError>;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Add `member` to the set at `key`; adding an existing member is a no-op
    async fn append_to_set(&self, key: &str, member: &str) -> Result<(), StoreError>;

    async fn set_contains(&self, key: &str, member: &str) -> Result<bool, StoreError>;

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// Unconditionally delete `key`, returning whether it existed
    async fn remove(&self, key: &str) -> Result<bool, StoreError>;
}
