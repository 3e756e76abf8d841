// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store key layout
//!
//! ```text
//! {prefix}:lock:{key}            lock lease (JSON LockEntry, with TTL)
//! {prefix}:idem:{key}            idempotency record (JSON, with TTL)
//! {prefix}:saga:{saga_id}:steps  completed step names (set, no TTL)
//! ```

/// Maps caller keys onto namespaced store keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    prefix: String,
}

impl KeySpace {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn lock(&self, key: &str) -> String {
        format!("{}:lock:{}", self.prefix, key)
    }

    pub fn idempotency(&self, key: &str) -> String {
        format!("{}:idem:{}", self.prefix, key)
    }

    pub fn saga_steps(&self, saga_id: &str) -> String {
        format!("{}:saga:{}:steps", self.prefix, saga_id)
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new("coord")
    }
}
