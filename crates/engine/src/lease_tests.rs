// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use coord_adapters::{FakeStore, StoreOp};

const TTL: Duration = Duration::from_secs(3);

async fn held(store: &FakeStore) -> LockHandle {
    store.try_create("lease", "me", TTL).await.unwrap();
    LockHandle::new(
        "lease",
        OwnerToken::new("me"),
        store.clock().now(),
        TTL,
        CancellationToken::new(),
    )
}

fn renewal(store: &FakeStore, handle: &LockHandle) -> Renewal<FakeStore, coord_core::FakeClock> {
    Renewal {
        store: store.clone(),
        clock: store.clock().clone(),
        store_key: "lease".to_string(),
        value: "me".to_string(),
        ttl: TTL,
        interval: Duration::from_secs(1),
        handle: handle.clone(),
    }
}

#[tokio::test(start_paused = true)]
async fn renews_every_interval_until_stopped() {
    let store = FakeStore::new();
    let handle = held(&store).await;
    let task = renewal(&store, &handle).spawn();

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(store.count(StoreOp::Refresh), 3);

    handle.token().cancel();
    assert!(task.await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn renewal_extends_expiry() {
    let store = FakeStore::new();
    let handle = held(&store).await;
    let first = handle.expires_at();
    let task = renewal(&store, &handle).spawn();

    store.clock().advance(Duration::from_secs(1));
    tokio::time::sleep(Duration::from_millis(1500)).await;

    assert_eq!(handle.expires_at(), first + Duration::from_secs(1));
    handle.token().cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn rejected_refresh_cancels_lease() {
    let store = FakeStore::new();
    let handle = held(&store).await;
    store.reject_refresh(true);
    let task = renewal(&store, &handle).spawn();

    handle.cancelled().await;

    assert!(matches!(task.await.unwrap(), Some(LeaseLoss::NotOwned)));
    assert!(handle.is_cancelled());
    assert_eq!(store.count(StoreOp::Refresh), 1);
}

#[tokio::test(start_paused = true)]
async fn store_outage_cancels_lease() {
    let store = FakeStore::new();
    let handle = held(&store).await;
    store.set_unavailable(true);
    let task = renewal(&store, &handle).spawn();

    let loss = task.await.unwrap();

    assert!(matches!(loss, Some(LeaseLoss::RenewalFailed(_))));
    assert!(handle.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn evicted_and_retaken_entry_is_not_owned() {
    let store = FakeStore::new();
    let handle = held(&store).await;
    let task = renewal(&store, &handle).spawn();

    store.evict("lease").await;
    store.try_create("lease", "someone-else", TTL).await.unwrap();

    assert!(matches!(task.await.unwrap(), Some(LeaseLoss::NotOwned)));
    assert_eq!(
        store.memory().get("lease").await.unwrap().as_deref(),
        Some("someone-else")
    );
}

#[tokio::test(start_paused = true)]
async fn zero_interval_still_ticks() {
    let store = FakeStore::new();
    let handle = held(&store).await;
    let task = Renewal {
        interval: Duration::ZERO,
        ..renewal(&store, &handle)
    }
    .spawn();

    tokio::time::sleep(Duration::from_millis(1)).await;
    handle.token().cancel();

    assert!(task.await.unwrap().is_none());
    assert!(store.count(StoreOp::Refresh) >= 1);
}
