//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGTERM and SIGINT handlers before any listener starts
//! - Resolve once either arrives
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Registration failure is returned, not panicked on

use std::fmt;

use crate::lifecycle::LifecycleError;

/// Signal that started the shutdown sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationSignal::Interrupt => f.write_str("SIGINT"),
            TerminationSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Installed handlers for the termination signals.
#[cfg(unix)]
pub struct TerminationListener {
    sigterm: tokio::signal::unix::Signal,
    sigint: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl TerminationListener {
    pub fn install() -> Result<Self, LifecycleError> {
        use tokio::signal::unix::{signal, SignalKind};

        let sigterm = signal(SignalKind::terminate()).map_err(LifecycleError::Signal)?;
        let sigint = signal(SignalKind::interrupt()).map_err(LifecycleError::Signal)?;
        Ok(Self { sigterm, sigint })
    }

    /// Wait for SIGTERM or SIGINT.
    pub async fn recv(mut self) -> TerminationSignal {
        let received = tokio::select! {
            _ = self.sigterm.recv() => TerminationSignal::Terminate,
            _ = self.sigint.recv() => TerminationSignal::Interrupt,
        };
        tracing::info!(signal = %received, "Received termination signal");
        received
    }
}

/// Installed handler for Ctrl+C.
#[cfg(not(unix))]
pub struct TerminationListener;

#[cfg(not(unix))]
impl TerminationListener {
    pub fn install() -> Result<Self, LifecycleError> {
        Ok(Self)
    }

    /// Wait for Ctrl+C.
    pub async fn recv(self) -> TerminationSignal {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to wait for Ctrl+C");
        }
        tracing::info!("Received Ctrl+C");
        TerminationSignal::Interrupt
    }
}
