// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Every coordination diagnostic is tagged with the caller's correlation id

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use coord_adapters::{FakeStore, Store, TracedStore};
use coord_engine::{BoxError, CoordinationContext, Coordinator, CorrelationId};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.logs.lock().unwrap()).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

#[test]
fn contended_lock_is_logged_with_correlation() {
    let (logs, result) = with_tracing(|| async {
        let store = FakeStore::new();
        store
            .try_create("coord:lock:order:1", "someone", Duration::from_secs(5))
            .await
            .unwrap();
        let coord = Coordinator::new(TracedStore::new(store));
        let ctx = CoordinationContext::new(CorrelationId::new("req-1234"));

        ctx.scope(
            coord
                .lock()
                .run("order:1", Duration::from_secs(5), |_| async { Ok::<_, BoxError>(()) }),
        )
        .await
    });

    assert!(result.is_err());
    assert!(logs.contains("lock.run"), "Logs:\n{}", logs);
    assert!(logs.contains("req-1234"), "Logs:\n{}", logs);
    assert!(logs.contains("lock contended"), "Logs:\n{}", logs);
    assert!(logs.contains("store.try_create"), "Logs:\n{}", logs);
}

#[test]
fn saga_steps_are_logged_with_saga_id() {
    let (logs, result) = with_tracing(|| async {
        let coord = Coordinator::new(FakeStore::new());
        let ctx = CoordinationContext::new(CorrelationId::new("req-5678"));

        ctx.scope(coord.saga().run("checkout-9", |steps| async move {
            steps.step("charge", || async { Ok::<_, BoxError>(()) }).await
        }))
        .await
    });

    assert!(result.is_ok());
    assert!(logs.contains("saga.step"), "Logs:\n{}", logs);
    assert!(logs.contains("checkout-9"), "Logs:\n{}", logs);
    assert!(logs.contains("step=\"charge\"") || logs.contains("step=charge"), "Logs:\n{}", logs);
    assert!(logs.contains("req-5678"), "Logs:\n{}", logs);
    assert!(logs.contains("step completed"), "Logs:\n{}", logs);
}

#[test]
fn suppressed_duplicate_names_first_caller() {
    let (logs, _) = with_tracing(|| async {
        let coord = Coordinator::new(FakeStore::new());
        let first = CoordinationContext::new(CorrelationId::new("first-call"));
        let second = CoordinationContext::new(CorrelationId::new("second-call"));

        let _ = first
            .scope(coord.idempotency().run("pay", Duration::from_secs(30), || async {
                Ok::<_, BoxError>(())
            }))
            .await;
        second
            .scope(coord.idempotency().run("pay", Duration::from_secs(30), || async {
                Ok::<_, BoxError>(())
            }))
            .await
    });

    let line = logs
        .lines()
        .find(|l| l.contains("duplicate suppressed"))
        .unwrap_or_default();
    assert!(line.contains("second-call"), "Logs:\n{}", logs);
    assert!(line.contains("first_correlation_id=first-call"), "Logs:\n{}", logs);
}
