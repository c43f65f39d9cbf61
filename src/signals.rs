//! OS signal subscription.
//!
//! Translates termination signals into a [`Closer`] trigger using Tokio's
//! async-safe signal handling. The listener stops after the first
//! subscribed signal it receives, so later deliveries never reach the
//! coordinator again.

use crate::shutdown::Closer;

/// Signal kinds a [`Closer`] can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// SIGINT (Ctrl+C).
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// SIGHUP.
    Hangup,
    /// SIGQUIT.
    Quit,
    /// SIGUSR1.
    UserDefined1,
    /// SIGUSR2.
    UserDefined2,
}

#[cfg(unix)]
impl Signal {
    pub(crate) fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;
        match self {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::Quit => SignalKind::quit(),
            Signal::UserDefined1 => SignalKind::user_defined1(),
            Signal::UserDefined2 => SignalKind::user_defined2(),
        }
    }
}

/// Spawn the background task that waits for the first subscribed signal and
/// then triggers the closer. Requires a running Tokio runtime.
pub(crate) fn spawn_listener(kinds: Vec<Signal>, closer: Closer) {
    tokio::spawn(async move {
        if let Some(received) = recv_any(kinds).await {
            tracing::info!(signal = ?received, "termination signal received, shutting down");
            closer.close_all().await;
        }
    });
}

/// Wait until any one of `kinds` is delivered, then stop listening.
///
/// Returns `None` when no handler could be installed, in which case the
/// coordinator can only be triggered explicitly.
#[cfg(unix)]
async fn recv_any(kinds: Vec<Signal>) -> Option<Signal> {
    use tokio::signal::unix::signal;

    let mut streams = Vec::new();
    for kind in kinds {
        match signal(kind.kind()) {
            Ok(stream) => streams.push((kind, stream)),
            Err(err) => {
                tracing::error!(signal = ?kind, error = %err, "failed to install signal handler");
            }
        }
    }
    if streams.is_empty() {
        return None;
    }

    let recvs: Vec<_> = streams
        .iter_mut()
        .map(|(kind, stream)| {
            let kind = *kind;
            Box::pin(async move { stream.recv().await.map(|_| kind) })
        })
        .collect();
    let (received, _, _) = futures_util::future::select_all(recvs).await;
    // The streams drop on return, ending the subscription.
    received
}

#[cfg(not(unix))]
async fn recv_any(kinds: Vec<Signal>) -> Option<Signal> {
    // Only Ctrl+C has a portable equivalent off Unix.
    if !kinds.contains(&Signal::Interrupt) {
        tracing::error!("no supported signal kinds on this platform");
        return None;
    }
    tokio::signal::ctrl_c().await.ok().map(|_| Signal::Interrupt)
}
