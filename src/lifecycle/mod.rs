//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Build state → Bind app, health, metrics → Serve
//!
//! Shutdown (shutdown.rs):
//!     Termination → Stop accepting → Drain app (deadline) → Abort the rest
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Signal handlers are installed before any listener binds
//! - Shutdown has a deadline: forced close of whatever is left after it

pub mod shutdown;
pub mod signals;
pub mod startup;

use std::future::Future;

use thiserror::Error;

use crate::config::AppConfig;
use crate::observability::RequestMetrics;

pub use shutdown::{Shutdown, ShutdownReport, ShutdownSignal};
pub use signals::{TerminationListener, TerminationSignal};
pub use startup::{start, Running};

/// Errors raised while setting up the process lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to install signal handler: {0}")]
    Signal(std::io::Error),
}

/// Start every listener, wait for `termination`, then shut down within the
/// configured deadline.
pub async fn run<F>(config: &AppConfig, metrics: RequestMetrics, termination: F) -> ShutdownReport
where
    F: Future<Output = ()>,
{
    let running = start(config, metrics).await;
    termination.await;
    running.shutdown(config.shutdown_deadline).await
}
