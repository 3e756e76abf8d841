// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `coordctl lock|once <key> --ttl <dur> -- <command>...`

use super::{child, Session};
use anyhow::Result;
use clap::Args;
use coord_adapters::Store;
use coord_engine::{Coordinator, IdempotencyOutcome};
use std::time::Duration;

#[derive(Args)]
pub struct RunArgs {
    /// Lock or idempotency key (e.g. "order:1")
    pub key: String,

    /// Lease length or dedup window (e.g. "30s", "5m")
    #[arg(long, value_parser = humantime::parse_duration, default_value = "30s")]
    pub ttl: Duration,

    /// Command and arguments to run
    #[arg(last = true, required = true)]
    pub command: Vec<String>,
}

/// Run the command while holding the lock on `key`
pub async fn lock<S: Store>(coord: &Coordinator<S>, session: &Session, args: RunArgs) -> Result<()> {
    let env = [
        ("COORD_CORRELATION_ID", session.ctx.correlation_id().to_string()),
        ("COORD_LOCK_KEY", args.key.clone()),
    ];

    coord
        .lock()
        .run_with(&session.ctx, &session.cancel, &args.key, args.ttl, |_| {
            child::run(&args.command, &env)
        })
        .await?;
    Ok(())
}

/// Run the command unless `key` already completed within its TTL
pub async fn once<S: Store>(coord: &Coordinator<S>, session: &Session, args: RunArgs) -> Result<()> {
    let env = [
        ("COORD_CORRELATION_ID", session.ctx.correlation_id().to_string()),
        ("COORD_IDEMPOTENCY_KEY", args.key.clone()),
    ];

    let outcome = coord
        .idempotency()
        .run_with(&session.ctx, &session.cancel, &args.key, args.ttl, || {
            child::run(&args.command, &env)
        })
        .await?;

    if let IdempotencyOutcome::Suppressed = outcome {
        eprintln!("{} already completed, skipped", args.key);
    }
    Ok(())
}
