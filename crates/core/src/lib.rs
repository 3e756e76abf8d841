// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! coord-core: shared building blocks for the coordination toolkit
//!
//! This crate provides:
//! - Clock abstraction with a controllable fake for lease/TTL tests
//! - Correlation ids and lock owner tokens
//! - The immutable `CoordinationContext` threaded through every call
//! - TOML configuration for store endpoints, key layout, and lease renewal

pub mod clock;
pub mod config;
pub mod context;
pub mod id;

pub use clock::{Clock, FakeClock, SystemClock};
pub use config::{ConfigError, CoordinationConfig, LockSettings, StoreSettings};
pub use context::CoordinationContext;
pub use id::{CorrelationId, IdGen, OwnerToken, SequentialIdGen, UuidIdGen};
