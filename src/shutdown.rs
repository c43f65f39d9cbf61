//! Shutdown coordination for long-running services.
//!
//! # Responsibilities
//! - Collect close functions from subsystems during normal operation
//! - Run every collected function concurrently, exactly once, at shutdown
//! - Let any number of tasks block until the whole batch has settled
//!
//! # Design Decisions
//! - One-shot gate: concurrent triggers collapse into a single run, and
//!   every caller unblocks only after that run has settled
//! - Close failures are logged and swallowed; shutdown itself never fails
//! - No ordering between close functions; registrants must keep them
//!   independent of each other

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use tokio::sync::watch;

use crate::signals::{self, Signal};

/// Boxed error type carried out of close functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A registered close function. Invoked at most once.
pub type CloseFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<(), BoxError>> + Send>;

/// Coordinates graceful teardown of process-wide resources.
///
/// Subsystems register close functions with [`add`](Closer::add) or
/// [`extend`](Closer::extend). Triggering [`close_all`](Closer::close_all),
/// directly or through a subscribed OS signal, drains the registry once and
/// runs every drained function on its own task. [`wait`](Closer::wait)
/// blocks until the whole batch has settled.
///
/// Handles are cheap to clone and share one registry, so the instance built
/// at the composition point can be handed to every subsystem that owns a
/// resource worth closing.
#[derive(Clone)]
pub struct Closer {
    inner: Arc<Inner>,
}

struct Inner {
    pending: Mutex<Pending>,
    closing: AtomicBool,
    done_tx: watch::Sender<bool>,
    done_rx: watch::Receiver<bool>,
}

#[derive(Default)]
struct Pending {
    funcs: Vec<CloseFn>,
    drained: bool,
}

impl Closer {
    /// Create a coordinator that is only ever triggered explicitly.
    pub fn new() -> Self {
        let (done_tx, done_rx) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                pending: Mutex::new(Pending::default()),
                closing: AtomicBool::new(false),
                done_tx,
                done_rx,
            }),
        }
    }

    /// Create a coordinator that additionally triggers itself when the
    /// process receives any one of `kinds`.
    ///
    /// The listener stops after the first subscribed signal it sees, so a
    /// second signal has no further effect on the coordinator. Must be
    /// called from within a Tokio runtime when `kinds` is non-empty.
    pub fn with_signals(kinds: impl IntoIterator<Item = Signal>) -> Self {
        let closer = Self::new();
        let kinds: Vec<Signal> = kinds.into_iter().collect();
        if !kinds.is_empty() {
            signals::spawn_listener(kinds, closer.clone());
        }
        closer
    }

    /// Register a close function.
    ///
    /// Safe to call concurrently with other registrations and with a
    /// trigger in progress. A registration that arrives after the registry
    /// has been drained is dropped with a warning and never runs.
    pub fn add<F, Fut, E>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError>,
    {
        self.push(Box::new(move || {
            Box::pin(async move { f().await.map_err(Into::into) })
        }));
    }

    /// Register a batch of already-boxed close functions, preserving their
    /// order in the registry.
    pub fn extend(&self, funcs: impl IntoIterator<Item = CloseFn>) {
        for f in funcs {
            self.push(f);
        }
    }

    fn push(&self, f: CloseFn) {
        let mut pending = self.inner.pending.lock().expect("pending registry poisoned");
        if pending.drained {
            tracing::warn!("close function registered after shutdown began, dropping it");
            return;
        }
        pending.funcs.push(f);
    }

    /// Trigger shutdown. Idempotent and safe to call from any number of
    /// tasks.
    ///
    /// The first caller drains the registry and runs every drained close
    /// function on its own task; all callers, including later ones, return
    /// only after that single run has fully settled. Failures are logged
    /// per function and never propagate.
    pub async fn close_all(&self) {
        if self.inner.closing.swap(true, Ordering::SeqCst) {
            // Another caller already owns the drain; share its completion.
            self.wait().await;
            return;
        }

        let funcs = {
            let mut pending = self.inner.pending.lock().expect("pending registry poisoned");
            pending.drained = true;
            std::mem::take(&mut pending.funcs)
        };

        tracing::debug!(count = funcs.len(), "running close functions");
        let tasks: Vec<_> = funcs.into_iter().map(|f| tokio::spawn(f())).collect();
        for task in tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::error!(error = %err, "registered close function returned an error");
                }
                Err(err) => {
                    tracing::error!(error = %err, "registered close function panicked");
                }
            }
        }

        let _ = self.inner.done_tx.send(true);
        tracing::debug!("shutdown complete");
    }

    /// Block until shutdown has been triggered and every drained close
    /// function has settled.
    ///
    /// Blocks indefinitely if shutdown is never triggered; callers needing
    /// a bound should race this against their own timeout.
    pub async fn wait(&self) {
        let mut rx = self.inner.done_rx.clone();
        let _ = rx.wait_for(|done| *done).await;
    }

    /// Whether a trigger has been accepted. The drained batch may still be
    /// running.
    pub fn is_shutting_down(&self) -> bool {
        self.inner.closing.load(Ordering::SeqCst)
    }

    /// Whether every drained close function has settled.
    pub fn is_done(&self) -> bool {
        *self.inner.done_rx.borrow()
    }
}

impl Default for Closer {
    fn default() -> Self {
        Self::new()
    }
}
