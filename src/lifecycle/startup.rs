//! Startup orchestration.
//!
//! # Responsibilities
//! - Log configuration warnings
//! - Bind the application, health and metrics listeners in that order
//! - Spawn one serving task per bound listener
//! - Hand back a [`Running`] handle that knows how to stop them
//!
//! # Design Decisions
//! - The metrics registry is filled by the caller before anything binds
//! - A listener that fails to bind is logged and skipped; the others still run
//! - Only the application listener drains on shutdown, the others are aborted

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::config::{validate_config, AppConfig};
use crate::http::routes::{app_router, health_router, metrics_router};
use crate::http::{AppState, Draining, HttpServer};
use crate::lifecycle::shutdown::{Shutdown, ShutdownReport};
use crate::net::Listener;
use crate::observability::RequestMetrics;

/// A listener with its serving task.
struct Served<T> {
    addr: SocketAddr,
    task: JoinHandle<T>,
}

/// Handle to the running listeners.
pub struct Running {
    shutdown: Shutdown,
    app: Option<Served<Draining>>,
    health: Option<Served<()>>,
    metrics: Option<Served<()>>,
}

/// Bind every configured listener and start serving.
///
/// Bind failures are logged at error level and leave that listener out.
pub async fn start(config: &AppConfig, metrics: RequestMetrics) -> Running {
    for warning in validate_config(config) {
        tracing::warn!(%warning, "Configuration warning");
    }

    let shutdown = Shutdown::new();
    let registry = metrics.registry().clone();
    let state = AppState::new(&config.version, config.timings);
    let fold_probes = config.check_address.is_none();

    let app = match Listener::bind("app", &config.listen_address).await {
        Ok(listener) => {
            let addr = listener.local_addr();
            let server = HttpServer::new("app", app_router(state, metrics, fold_probes));
            let task = tokio::spawn(server.serve_until(listener, shutdown.subscribe()));
            Some(Served { addr, task })
        }
        Err(e) => {
            tracing::error!(error = %e, "Application listener not started");
            None
        }
    };

    let health = match &config.check_address {
        Some(address) => match Listener::bind("health", address).await {
            Ok(listener) => {
                let addr = listener.local_addr();
                let task = tokio::spawn(HttpServer::new("health", health_router()).serve(listener));
                Some(Served { addr, task })
            }
            Err(e) => {
                tracing::error!(error = %e, "Health listener not started");
                None
            }
        },
        None => {
            tracing::info!("Health checks served on the application listener");
            None
        }
    };

    let metrics = match Listener::bind("metrics", &config.metrics_address).await {
        Ok(listener) => {
            let addr = listener.local_addr();
            let task =
                tokio::spawn(HttpServer::new("metrics", metrics_router(registry)).serve(listener));
            Some(Served { addr, task })
        }
        Err(e) => {
            tracing::error!(error = %e, "Metrics listener not started");
            None
        }
    };

    Running {
        shutdown,
        app,
        health,
        metrics,
    }
}

impl Running {
    pub fn app_addr(&self) -> Option<SocketAddr> {
        self.app.as_ref().map(|served| served.addr)
    }

    pub fn health_addr(&self) -> Option<SocketAddr> {
        self.health.as_ref().map(|served| served.addr)
    }

    pub fn metrics_addr(&self) -> Option<SocketAddr> {
        self.metrics.as_ref().map(|served| served.addr)
    }

    /// Stop accepting, drain the application listener for at most
    /// `deadline`, then stop the health and metrics listeners.
    pub async fn shutdown(self, deadline: Duration) -> ShutdownReport {
        tracing::info!("Shutting down gracefully the server ...");
        let started = Instant::now();
        self.shutdown.trigger();

        let app = match self.app {
            Some(served) => match served.task.await {
                Ok(draining) => Some(draining.finish(deadline).await),
                Err(e) => {
                    tracing::error!(error = %e, "Application server task failed");
                    None
                }
            },
            None => None,
        };

        for served in [self.health, self.metrics].into_iter().flatten() {
            served.task.abort();
            let _ = served.task.await;
        }

        let report = ShutdownReport {
            app,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            outcome = ?report.app,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Shutdown complete"
        );
        report
    }
}
