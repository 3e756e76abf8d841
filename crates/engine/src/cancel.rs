// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancellation at suspension points

use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Drive `fut` until it finishes or `cancel` fires
///
/// Cancellation wins when both are ready; `fut` is dropped at its current
/// suspension point.
pub(crate) async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}
