// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inspection commands

use super::Session;
use crate::output;
use anyhow::Result;
use clap::{Args, Subcommand};
use coord_adapters::Store;
use coord_engine::{Coordinator, IdempotencyRecord, LockEntry, RecordState};
use serde::Serialize;
use std::fmt;

#[derive(Args)]
pub struct InspectArgs {
    #[command(subcommand)]
    pub command: InspectCommand,
}

#[derive(Subcommand)]
pub enum InspectCommand {
    /// Show who holds a lock
    Lock {
        /// Lock key
        key: String,
    },
    /// Show the idempotency record for a key
    Once {
        /// Idempotency key
        key: String,
    },
}

#[derive(Serialize)]
struct LockReport {
    key: String,
    held: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    holder: Option<LockEntry>,
}

impl fmt::Display for LockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.holder {
            Some(entry) => write!(
                f,
                "{} held by {} (correlation {})",
                self.key, entry.owner, entry.correlation_id
            ),
            None => write!(f, "{} is not locked", self.key),
        }
    }
}

#[derive(Serialize)]
struct OnceReport {
    key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    record: Option<IdempotencyRecord>,
}

impl fmt::Display for OnceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(record) = &self.record else {
            return write!(f, "{} has no record", self.key);
        };
        let state = match record.state {
            RecordState::InProgress => "in progress",
            RecordState::Completed => "completed",
        };
        writeln!(f, "Key: {}", self.key)?;
        writeln!(f, "State: {}", state)?;
        writeln!(f, "Owner: {}", record.owner)?;
        writeln!(f, "Correlation: {}", record.correlation_id)?;
        write!(f, "Claimed: {}", record.claimed_at.to_rfc3339())?;
        if let Some(at) = record.completed_at {
            write!(f, "\nCompleted: {}", at.to_rfc3339())?;
        }
        Ok(())
    }
}

pub async fn handle<S: Store>(coord: &Coordinator<S>, session: &Session, args: InspectArgs) -> Result<()> {
    match args.command {
        InspectCommand::Lock { key } => {
            let holder = coord.lock().inspect(&key).await?;
            let report = LockReport {
                held: holder.is_some(),
                key,
                holder,
            };
            output::print(&report, session.format)
        }
        InspectCommand::Once { key } => {
            let record = coord.idempotency().status(&key).await?;
            output::print(&OnceReport { key, record }, session.format)
        }
    }
}
