// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! coordctl - run commands under distributed locks, idempotency keys, and sagas

mod commands;
mod error;
mod output;
mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{inspect, run, saga, Session};
use coord_adapters::{MemoryStore, RedisStore, Store, TracedStore};
use coord_core::{CoordinationConfig, CoordinationContext, CorrelationId};
use coord_engine::{CancellationToken, Coordinator};
use output::OutputFormat;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use store::Endpoint;

#[derive(Parser)]
#[command(
    name = "coordctl",
    version,
    about = "Distributed locks, idempotency keys, and resumable sagas"
)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store URL (redis://..., rediss://..., or memory://), overriding config
    #[arg(long, global = true)]
    store: Option<String>,

    /// Correlation id to continue instead of generating one
    #[arg(long, global = true)]
    correlation_id: Option<String>,

    /// Output format for inspection commands
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command while holding a lock
    Lock(run::RunArgs),
    /// Run a command at most once per idempotency key
    Once(run::RunArgs),
    /// Saga ledger management
    Saga(saga::SagaArgs),
    /// Show current lock or idempotency state
    Inspect(inspect::InspectArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logging();
    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let report = error::CliError::from_anyhow(&e);
            eprint!("{}", report);
            report.exit_code()
        }
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref(), cli.store)?;

    let ctx = match cli.correlation_id {
        Some(id) => CoordinationContext::new(CorrelationId::new(id)),
        None => CoordinationContext::create(),
    };
    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupted, cancelling");
                cancel.cancel();
            }
        }
    });
    let session = Session {
        ctx,
        cancel,
        format: cli.format,
    };

    match Endpoint::parse(&config.store.url)? {
        Endpoint::Memory => {
            let store = TracedStore::new(MemoryStore::new());
            dispatch(Coordinator::from_config(store, &config), cli.command, &session).await
        }
        Endpoint::Redis => {
            let store = RedisStore::connect(&config.store)
                .await
                .map_err(|source| store::ConnectError { source })?;
            let store = TracedStore::new(store);
            dispatch(Coordinator::from_config(store, &config), cli.command, &session).await
        }
    }
}

async fn dispatch<S: Store>(
    coord: Coordinator<S>,
    command: Commands,
    session: &Session,
) -> Result<()> {
    let work = async {
        match command {
            Commands::Lock(args) => run::lock(&coord, session, args).await,
            Commands::Once(args) => run::once(&coord, session, args).await,
            Commands::Saga(args) => saga::handle(&coord, session, args).await,
            Commands::Inspect(args) => inspect::handle(&coord, session, args).await,
        }
    };
    session.ctx.clone().scope(work).await
}

fn load_config(path: Option<&Path>, store_url: Option<String>) -> Result<CoordinationConfig> {
    let mut config = match path {
        Some(path) => CoordinationConfig::load(path)?,
        None => CoordinationConfig::from_env()?,
    };
    if let Some(url) = store_url {
        config.store.url = url;
        config.validate()?;
    }
    Ok(config)
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
