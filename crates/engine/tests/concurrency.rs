// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrent callers racing on shared keys
//!
//! These run on a multi-threaded runtime against the in-memory store, so
//! correctness comes only from the store's atomic operations.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use coord_adapters::MemoryStore;
use coord_engine::{BoxError, CoordinationError, Coordinator, IdempotencyOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

const CALLERS: usize = 8;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn at_most_one_lock_holder_at_a_time() {
    let coord = Coordinator::new(MemoryStore::new());
    let barrier = Arc::new(Barrier::new(CALLERS));
    let holders = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..CALLERS {
        let coord = coord.clone();
        let barrier = barrier.clone();
        let holders = holders.clone();
        let peak = peak.clone();
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            coord
                .lock()
                .run("shared", Duration::from_secs(5), |_| async move {
                    let now = holders.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    holders.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, BoxError>(())
                })
                .await
        }));
    }

    let mut won = 0;
    let mut contended = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(()) => won += 1,
            Err(CoordinationError::LockContended { .. }) => contended += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert!(won >= 1);
    assert_eq!(won + contended, CALLERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn lock_is_free_again_after_release() {
    let coord = Coordinator::new(MemoryStore::new());

    for round in 0..3 {
        let value = coord
            .lock()
            .run("serial", Duration::from_secs(5), |_| async move { Ok::<_, BoxError>(round) })
            .await
            .unwrap();
        assert_eq!(value, round);
    }
    assert_eq!(coord.lock().inspect("serial").await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_claims_execute_exactly_once() {
    let coord = Coordinator::new(MemoryStore::new());
    let barrier = Arc::new(Barrier::new(CALLERS));
    let runs = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..CALLERS {
        let coord = coord.clone();
        let barrier = barrier.clone();
        let runs = runs.clone();
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            coord
                .idempotency()
                .run("order:1", Duration::from_secs(30), || async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    Ok::<_, BoxError>("charged")
                })
                .await
        }));
    }

    let mut executed = 0;
    let mut in_flight = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(IdempotencyOutcome::Executed("charged")) => executed += 1,
            Err(CoordinationError::DuplicateInFlight { .. }) => in_flight += 1,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    assert_eq!(executed, 1);
    assert_eq!(in_flight, CALLERS - 1);
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let later = coord
        .idempotency()
        .run("order:1", Duration::from_secs(30), || async { Ok::<_, BoxError>("charged") })
        .await
        .unwrap();
    assert_eq!(later, IdempotencyOutcome::Suppressed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_keys_race_independently() {
    let coord = Coordinator::new(MemoryStore::new());
    let barrier = Arc::new(Barrier::new(CALLERS));

    let mut tasks = Vec::new();
    for i in 0..CALLERS {
        let coord = coord.clone();
        let barrier = barrier.clone();
        tasks.push(tokio::spawn(async move {
            barrier.wait().await;
            coord
                .lock()
                .run(&format!("key-{i}"), Duration::from_secs(5), |_| async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok::<_, BoxError>(i)
                })
                .await
        }));
    }

    for (i, task) in tasks.into_iter().enumerate() {
        assert_eq!(task.await.unwrap().unwrap(), i);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn saga_steps_survive_a_crashed_run() {
    let coord = Coordinator::new(MemoryStore::new());
    let attempts = Arc::new(AtomicUsize::new(0));

    // First run dies inside "reserve"; the ledger keeps only "validate"
    let first = coord
        .saga()
        .run("checkout-42", |steps| async move {
            steps.step("validate", || async { Ok::<_, BoxError>(()) }).await?;
            steps
                .step("reserve", || async { Err::<(), _>("inventory service down") })
                .await?;
            Ok(())
        })
        .await;
    assert!(matches!(first, Err(CoordinationError::StepFailed { .. })));

    let counter = attempts.clone();
    coord
        .saga()
        .run("checkout-42", |steps| async move {
            steps
                .step("validate", || async {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, BoxError>(())
                })
                .await?;
            steps.step("reserve", || async { Ok::<_, BoxError>(()) }).await?;
            steps.step("ship", || async { Ok::<_, BoxError>(()) }).await?;
            Ok(())
        })
        .await
        .unwrap();

    assert_eq!(attempts.load(Ordering::SeqCst), 0);
    assert_eq!(
        coord.saga().completed_steps("checkout-42").await.unwrap(),
        vec!["reserve", "ship", "validate"]
    );
}

#[tokio::test]
async fn short_lease_survives_work_longer_than_its_ttl() {
    let coord = Coordinator::new(MemoryStore::new());

    let result = coord
        .lock()
        .run("short", Duration::from_millis(30), |handle| async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok::<_, BoxError>(handle.is_cancelled())
        })
        .await;

    assert!(matches!(result, Ok(false)), "{result:?}");
    assert!(coord.lock().inspect("short").await.unwrap().is_none());
}
