//! Toy daemon showing the intended composition: build one [`Closer`] at the
//! top level, hand clones to every subsystem, then wait for a signal.

use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use svc_lifecycle::{BoxError, Closer, Signal};

#[derive(Parser)]
#[command(name = "lifecycle-demo")]
#[command(about = "Demo daemon for coordinated graceful shutdown", long_about = None)]
struct Cli {
    /// Number of fake connection pools to register.
    #[arg(long, default_value_t = 3)]
    pools: usize,

    /// Make the last pool fail its close, to show failure isolation.
    #[arg(long)]
    flaky: bool,
}

#[derive(Debug, Error)]
enum PoolError {
    #[error("pool {0} still has {1} checked-out connections")]
    Busy(usize, usize),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "svc_lifecycle=debug,lifecycle_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let closer = Closer::with_signals([Signal::Interrupt, Signal::Terminate]);

    for id in 0..cli.pools {
        let flaky = cli.flaky && id + 1 == cli.pools;
        closer.add(move || close_pool(id, flaky));
    }

    tracing::info!(
        pools = cli.pools,
        "demo daemon running, send SIGINT or SIGTERM to stop"
    );
    closer.wait().await;
    tracing::info!("all pools drained, exiting");
}

async fn close_pool(id: usize, flaky: bool) -> Result<(), BoxError> {
    // Pretend to drain in-flight connections.
    tokio::time::sleep(Duration::from_millis(200)).await;
    if flaky {
        return Err(PoolError::Busy(id, 2).into());
    }
    tracing::info!(pool = id, "pool closed");
    Ok(())
}
