//! End-to-end behavior of the public surface: one coordinator built at the
//! composition point, handles cloned into independent subsystems.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use svc_lifecycle::{BoxError, Closer};

fn register_fake_resource(closer: &Closer, closed: &Arc<AtomicUsize>) {
    let closed = Arc::clone(closed);
    closer.add(move || async move {
        closed.fetch_add(1, Ordering::SeqCst);
        Ok::<_, BoxError>(())
    });
}

#[tokio::test]
async fn cloned_handles_share_one_registry() {
    let closer = Closer::new();
    let closed = Arc::new(AtomicUsize::new(0));

    // Each "subsystem" gets its own handle and registers its own teardown.
    let db = closer.clone();
    let producer = closer.clone();
    register_fake_resource(&db, &closed);
    register_fake_resource(&producer, &closed);
    register_fake_resource(&closer, &closed);

    closer.close_all().await;
    assert_eq!(closed.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn every_waiter_unblocks_after_the_trigger() {
    let closer = Closer::new();
    let closed = Arc::new(AtomicUsize::new(0));
    register_fake_resource(&closer, &closed);

    let waiters: Vec<_> = (0..10)
        .map(|_| {
            let closer = closer.clone();
            tokio::spawn(async move { closer.wait().await })
        })
        .collect();

    // Let the waiters start blocking before the trigger fires.
    tokio::time::sleep(Duration::from_millis(50)).await;
    closer.close_all().await;

    for waiter in waiters {
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("a waiter was never released")
            .unwrap();
    }
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}
