// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing error reports with context, suggestions, and exit codes

use crate::store::{ConnectError, UnsupportedStore};
use coord_core::ConfigError;
use coord_engine::CoordinationError;
use std::fmt;
use std::process::ExitCode;

/// `EX_TEMPFAIL` from sysexits(3): someone else holds the key, retry later
pub const EXIT_TEMPFAIL: u8 = 75;

/// Error with context and recovery suggestions for display on stderr
#[derive(Debug)]
pub struct CliError {
    /// What went wrong
    pub message: String,
    /// Why it might have happened
    pub context: Vec<String>,
    /// How to fix it
    pub suggestions: Vec<String>,
    pub code: u8,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: Vec::new(),
            suggestions: Vec::new(),
            code: 1,
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    fn with_code(mut self, code: u8) -> Self {
        self.code = code;
        self
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(self.code)
    }

    /// Build a report from any command failure
    pub fn from_anyhow(err: &anyhow::Error) -> Self {
        if let Some(e) = err.downcast_ref::<CoordinationError>() {
            return Self::coordination(e);
        }
        if let Some(e) = err.downcast_ref::<ConnectError>() {
            return Self::new(e.to_string())
                .with_context("The store did not accept a connection")
                .with_suggestion("Check the URL given by --store, COORD_STORE_URL, or store.url")
                .with_suggestion("Use --store memory:// for a local dry run");
        }
        if let Some(e) = err.downcast_ref::<UnsupportedStore>() {
            return Self::new(e.to_string());
        }
        if let Some(e) = err.downcast_ref::<ConfigError>() {
            return Self::new(e.to_string())
                .with_suggestion("Known sections are key_prefix, [store], and [lock]");
        }

        err.chain()
            .skip(1)
            .fold(Self::new(err.to_string()), |report, cause| {
                report.with_context(cause.to_string())
            })
    }

    fn coordination(err: &CoordinationError) -> Self {
        let report = Self::new(err.to_string());
        match err {
            CoordinationError::LockContended { key, .. } => report
                .with_context("Another process holds this lock")
                .with_suggestion("Retry after the holder finishes")
                .with_suggestion(format!("See the holder: coordctl inspect lock {}", key))
                .with_code(EXIT_TEMPFAIL),
            CoordinationError::DuplicateInFlight { key, .. } => report
                .with_context("Another process is running this key right now")
                .with_suggestion(format!("See the claim: coordctl inspect once {}", key))
                .with_code(EXIT_TEMPFAIL),
            CoordinationError::LockLost { .. } => report
                .with_context("The command was stopped; its effects may be partial")
                .with_suggestion("Use a longer --ttl or check store health"),
            CoordinationError::StoreUnavailable { source, .. } => report
                .with_context(source.to_string())
                .with_suggestion("Check that the store is reachable and retry"),
            CoordinationError::WorkFailed { source, .. } => report.with_context(source.to_string()),
            _ => report,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "error: {}", self.message)?;

        if !self.context.is_empty() {
            writeln!(f)?;
            for ctx in &self.context {
                writeln!(f, "  -> {}", ctx)?;
            }
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "suggestions:")?;
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, suggestion)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
