// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod child;
pub mod inspect;
pub mod run;
pub mod saga;

use crate::output::OutputFormat;
use coord_core::CoordinationContext;
use coord_engine::CancellationToken;

/// Per-invocation state shared by every command
pub struct Session {
    pub ctx: CoordinationContext,
    /// Fired on Ctrl-C
    pub cancel: CancellationToken,
    pub format: OutputFormat,
}
