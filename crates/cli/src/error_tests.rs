// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use coord_adapters::StoreError;
use coord_core::CorrelationId;

fn contended() -> CoordinationError {
    CoordinationError::LockContended {
        key: "order:1".to_string(),
        correlation_id: CorrelationId::new("req-1"),
    }
}

#[test]
fn contention_exits_tempfail() {
    let report = CliError::from_anyhow(&anyhow::Error::new(contended()));
    assert_eq!(report.code, EXIT_TEMPFAIL);
    assert!(report
        .suggestions
        .iter()
        .any(|s| s.contains("coordctl inspect lock order:1")));
}

#[test]
fn in_flight_exits_tempfail() {
    let err = CoordinationError::DuplicateInFlight {
        key: "pay".to_string(),
        correlation_id: CorrelationId::new("req-1"),
    };
    assert_eq!(CliError::from_anyhow(&err.into()).code, EXIT_TEMPFAIL);
}

#[test]
fn other_failures_exit_one() {
    let err = CoordinationError::StoreUnavailable {
        operation: "acquire",
        key: "k".to_string(),
        correlation_id: CorrelationId::new("req-1"),
        source: StoreError::Unavailable("connection refused".to_string()),
    };
    let report = CliError::from_anyhow(&err.into());
    assert_eq!(report.code, 1);
    assert!(report.context.iter().any(|c| c.contains("connection refused")));
}

#[test]
fn plain_errors_keep_their_cause_chain() {
    let err = anyhow::anyhow!("root cause").context("while reading");
    let report = CliError::from_anyhow(&err);
    assert_eq!(report.message, "while reading");
    assert_eq!(report.context, vec!["root cause"]);
}

#[test]
fn display_layout() {
    let report = CliError::new("it broke")
        .with_context("because")
        .with_suggestion("fix it");
    assert_eq!(
        report.to_string(),
        "error: it broke\n\n  -> because\n\nsuggestions:\n  1. fix it\n"
    );
}
