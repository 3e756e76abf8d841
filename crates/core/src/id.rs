// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Correlation ids and lease owner tokens

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Opaque identifier tying together every diagnostic of one logical operation
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id (UUID v4, no hyphens)
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token proving ownership of one lock acquisition or idempotency claim
///
/// A new token is generated per attempt, never reused.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerToken(String);

impl OwnerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates owner tokens for store claims
pub trait IdGen: Clone + Send + Sync + 'static {
    fn owner_token(&self) -> OwnerToken;
}

/// UUID-based generator for production use
#[derive(Clone, Copy, Debug, Default)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn owner_token(&self) -> OwnerToken {
        OwnerToken(uuid::Uuid::new_v4().to_string())
    }
}

/// Sequential generator for tests that assert on stored values
#[derive(Clone, Debug)]
pub struct SequentialIdGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialIdGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialIdGen {
    fn default() -> Self {
        Self::new("owner")
    }
}

impl IdGen for SequentialIdGen {
    fn owner_token(&self) -> OwnerToken {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        OwnerToken(format!("{}-{}", self.prefix, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_correlation_ids_are_unique_and_compact() {
        let a = CorrelationId::generate();
        let b = CorrelationId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(!a.as_str().contains('-'));
    }

    #[test]
    fn uuid_gen_creates_unique_tokens() {
        let id_gen = UuidIdGen;
        let t1 = id_gen.owner_token();
        let t2 = id_gen.owner_token();
        assert_ne!(t1, t2);
        assert_eq!(t1.as_str().len(), 36);
    }

    #[test]
    fn sequential_gen_is_shared_between_clones() {
        let id_gen1 = SequentialIdGen::new("holder");
        let id_gen2 = id_gen1.clone();
        assert_eq!(id_gen1.owner_token().as_str(), "holder-1");
        assert_eq!(id_gen2.owner_token().as_str(), "holder-2");
        assert_eq!(id_gen1.owner_token().as_str(), "holder-3");
    }
}
