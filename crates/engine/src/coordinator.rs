// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single entry point bundling the three coordination primitives

use crate::idempotency::IdempotencyGuard;
use crate::keys::KeySpace;
use crate::lock::LockManager;
use crate::saga::SagaRunner;
use coord_adapters::Store;
use coord_core::{Clock, CoordinationConfig, IdGen, SystemClock, UuidIdGen};

/// Lock, idempotency, and saga facades over one store
///
/// Holds no coordination state of its own; every call goes to the store.
/// Clones share the same store handle.
#[derive(Clone)]
pub struct Coordinator<S, G = UuidIdGen, C = SystemClock> {
    lock: LockManager<S, G, C>,
    idempotency: IdempotencyGuard<S, G, C>,
    saga: SagaRunner<S>,
}

impl<S: Store> Coordinator<S> {
    /// Coordinator with default key prefix and renewal settings
    pub fn new(store: S) -> Self {
        Self::from_config(store, &CoordinationConfig::default())
    }

    pub fn from_config(store: S, config: &CoordinationConfig) -> Self {
        Self::with_parts(store, config, UuidIdGen, SystemClock)
    }
}

impl<S, G, C> Coordinator<S, G, C>
where
    S: Store,
    G: IdGen,
    C: Clock,
{
    /// Coordinator with explicit id generation and clock
    pub fn with_parts(store: S, config: &CoordinationConfig, ids: G, clock: C) -> Self {
        let keys = KeySpace::new(config.key_prefix.clone());
        Self {
            lock: LockManager::new(
                store.clone(),
                keys.clone(),
                ids.clone(),
                clock.clone(),
                config.lock.clone(),
            ),
            idempotency: IdempotencyGuard::new(store.clone(), keys.clone(), ids, clock),
            saga: SagaRunner::new(store, keys),
        }
    }

    pub fn lock(&self) -> &LockManager<S, G, C> {
        &self.lock
    }

    pub fn idempotency(&self) -> &IdempotencyGuard<S, G, C> {
        &self.idempotency
    }

    pub fn saga(&self) -> &SagaRunner<S> {
        &self.saga
    }
}
