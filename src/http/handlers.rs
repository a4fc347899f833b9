//! Request handlers.
//!
//! - `GET /` - host name, version and caller address
//! - `GET /ready`, `GET /live` - probe endpoints, always `ok`
//! - `GET /load` - keeps every CPU busy for the load window
//! - `GET /delay` - answers `ok` after a fixed sleep
//!
//! Failures to identify the host or the caller are reported in the body with
//! a 200 status; the transport never sees an error.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{body::Body, extract::ConnectInfo, extract::State, http::Request};

use crate::config::HandlerTimings;

/// Resolves the local host name.
pub type HostnameFn = fn() -> io::Result<String>;

/// State shared by the application handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub version: Arc<str>,
    pub timings: HandlerTimings,
    pub hostname: HostnameFn,
}

impl AppState {
    pub fn new(version: &str, timings: HandlerTimings) -> Self {
        Self {
            version: Arc::from(version),
            timings,
            hostname: system_hostname,
        }
    }
}

/// Host name as the kernel reports it, falling back to `$HOSTNAME`.
pub fn system_hostname() -> io::Result<String> {
    let from_kernel = std::fs::read_to_string("/proc/sys/kernel/hostname")
        .map(|name| name.trim().to_string())
        .ok()
        .filter(|name| !name.is_empty());

    match from_kernel {
        Some(name) => Ok(name),
        None => std::env::var("HOSTNAME")
            .ok()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "host name unavailable")),
    }
}

/// Echo handler: who served the request, which build, and who asked.
pub async fn echo(State(state): State<AppState>, request: Request<Body>) -> String {
    let hostname = match (state.hostname)() {
        Ok(name) => name,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to resolve host name");
            return "Error getting hostname\n".to_string();
        }
    };

    let remote = match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => addr.ip(),
        None => return "Error getting remote address\n".to_string(),
    };

    format!(
        "Server name: {}\nServer version: {}\nRemote client address: {}\n",
        hostname, state.version, remote
    )
}

/// Liveness and readiness probe.
pub async fn probe() -> &'static str {
    "ok"
}

/// Raises the shared stop flag when dropped, so load workers end even if
/// the request future is cancelled mid-window.
struct StopOnDrop(Arc<AtomicBool>);

impl Drop for StopOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Busy-loop one blocking task per available CPU for the load window.
pub async fn load(State(state): State<AppState>) -> String {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let stop = Arc::new(AtomicBool::new(false));
    let stop_guard = StopOnDrop(Arc::clone(&stop));

    tracing::info!(
        cpus,
        window_ms = state.timings.load_window.as_millis() as u64,
        "Generating CPU load"
    );

    let workers: Vec<_> = (0..cpus)
        .map(|_| {
            let stop = Arc::clone(&stop);
            tokio::task::spawn_blocking(move || {
                while !stop.load(Ordering::Relaxed) {
                    std::hint::spin_loop();
                }
            })
        })
        .collect();

    tokio::time::sleep(state.timings.load_window).await;
    drop(stop_guard);

    let mut body = String::new();
    for (cpu, worker) in workers.into_iter().enumerate() {
        if let Err(e) = worker.await {
            tracing::warn!(cpu, error = %e, "Load worker failed");
        }
        body.push_str(&format!("Loading CPU: {}\n", cpu));
    }
    body
}

/// Sleep for the configured delay, then answer `ok`.
pub async fn delay(State(state): State<AppState>) -> &'static str {
    tokio::time::sleep(state.timings.delay).await;
    "ok"
}
