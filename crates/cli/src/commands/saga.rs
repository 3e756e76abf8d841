// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Saga ledger commands

use super::Session;
use crate::output;
use anyhow::Result;
use clap::{Args, Subcommand};
use coord_adapters::Store;
use coord_engine::Coordinator;
use serde::Serialize;
use std::fmt;

#[derive(Args)]
pub struct SagaArgs {
    #[command(subcommand)]
    pub command: SagaCommand,
}

#[derive(Subcommand)]
pub enum SagaCommand {
    /// List the completed steps of a saga
    Steps {
        /// Saga id
        saga_id: String,
    },
    /// Delete a saga's ledger so every step runs again
    Forget {
        /// Saga id
        saga_id: String,
    },
}

#[derive(Serialize)]
struct StepsReport {
    saga_id: String,
    completed: Vec<String>,
}

impl fmt::Display for StepsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.completed.is_empty() {
            return write!(f, "saga {} has no completed steps", self.saga_id);
        }
        write!(f, "{}", self.completed.join("\n"))
    }
}

pub async fn handle<S: Store>(coord: &Coordinator<S>, session: &Session, args: SagaArgs) -> Result<()> {
    match args.command {
        SagaCommand::Steps { saga_id } => {
            let completed = coord.saga().completed_steps(&saga_id).await?;
            output::print(&StepsReport { saga_id, completed }, session.format)
        }
        SagaCommand::Forget { saga_id } => {
            if coord.saga().forget(&saga_id).await? {
                println!("Forgot saga {}", saga_id);
            } else {
                println!("No ledger for saga {}", saga_id);
            }
            Ok(())
        }
    }
}
