//! Service lifecycle utilities.
//!
//! The core type is [`Closer`]: a registry of close functions that all run
//! concurrently, exactly once, when shutdown is triggered, either by an
//! explicit call or by a subscribed OS termination signal. Build one at the
//! composition point and clone the handle into every subsystem that owns a
//! resource worth closing.
//!
//! ```no_run
//! use svc_lifecycle::{BoxError, Closer, Signal};
//!
//! # async fn example() {
//! let closer = Closer::with_signals([Signal::Interrupt, Signal::Terminate]);
//! closer.add(|| async {
//!     // release a pool, flush a producer, close a file...
//!     Ok::<_, BoxError>(())
//! });
//! closer.wait().await;
//! # }
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::{BoxError, CloseFn, Closer};
pub use signals::Signal;
