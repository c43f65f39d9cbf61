#![cfg(unix)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use svc_lifecycle::{BoxError, Closer, Signal};

/// Long enough for a spawned listener to install its handlers, or for a
/// delivered signal to have been processed.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(200)).await;
}

#[tokio::test]
async fn subscribed_signal_acts_like_an_explicit_trigger() {
    let closer = Closer::with_signals([Signal::UserDefined1]);
    let counter = Arc::new(AtomicUsize::new(0));
    {
        let counter = Arc::clone(&counter);
        closer.add(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, BoxError>(())
        });
    }

    settle().await;
    unsafe { libc::raise(libc::SIGUSR1) };

    tokio::time::timeout(Duration::from_secs(2), closer.wait())
        .await
        .expect("signal did not trigger shutdown");
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert!(closer.is_done());

    // A second delivery has no further effect on the coordinator.
    unsafe { libc::raise(libc::SIGUSR1) };
    settle().await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn signal_after_explicit_trigger_is_inert() {
    let closer = Closer::with_signals([Signal::UserDefined2]);
    let counter = Arc::new(AtomicUsize::new(0));
    {
        let counter = Arc::clone(&counter);
        closer.add(move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, BoxError>(())
        });
    }

    settle().await;
    closer.close_all().await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);

    unsafe { libc::raise(libc::SIGUSR2) };
    settle().await;
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}
