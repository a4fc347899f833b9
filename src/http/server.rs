//! HTTP server setup and connection handling.
//!
//! # Responsibilities
//! - Accept connections on a bound listener
//! - Serve HTTP/1.1 and HTTP/2 via hyper-util, dispatching to an Axum router
//! - Attach the peer address to every request (`ConnectInfo`)
//! - Stop abruptly (task abort) or gracefully (stop accepting, drain with a
//!   deadline, then force-close what is left)

use std::future::Future;
use std::time::Duration;

use axum::{body::Body, extract::ConnectInfo, Router};
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::task::JoinSet;
use tower::Service;

use crate::lifecycle::shutdown::ShutdownSignal;
use crate::net::Listener;

/// Back-off after a failed accept, so a full fd table does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// How a graceful stop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every connection finished before the deadline.
    Drained { connections: usize },
    /// The deadline passed; `aborted` connections were closed forcibly.
    DeadlineExceeded { aborted: usize },
}

/// An HTTP server for one listener.
pub struct HttpServer {
    name: &'static str,
    router: Router,
}

impl HttpServer {
    /// Create a server named after the listener it will run on.
    pub fn new(name: &'static str, router: Router) -> Self {
        Self { name, router }
    }

    /// Serve until the surrounding task is aborted or the process exits.
    ///
    /// Open connections are closed when this future is dropped.
    pub async fn serve(self, listener: Listener) {
        tracing::info!(
            listener = self.name,
            address = %listener.local_addr(),
            "Server started"
        );
        let _ = self.accept_loop(listener, std::future::pending()).await;
    }

    /// Serve until `shutdown` fires, then stop accepting.
    ///
    /// The returned [`Draining`] owns every connection still open; call
    /// [`Draining::finish`] to wait for them with a deadline.
    pub async fn serve_until(self, listener: Listener, mut shutdown: ShutdownSignal) -> Draining {
        tracing::info!(
            listener = self.name,
            address = %listener.local_addr(),
            "Server started"
        );
        let (graceful, connections) = self
            .accept_loop(listener, async move { shutdown.wait().await })
            .await;

        Draining {
            name: self.name,
            graceful,
            connections,
        }
    }

    async fn accept_loop<F>(&self, listener: Listener, stop: F) -> (GracefulShutdown, JoinSet<()>)
    where
        F: Future<Output = ()>,
    {
        let builder = AutoBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let mut connections = JoinSet::new();

        tokio::pin!(stop);

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (socket, remote_addr) = match accepted {
                        Ok(conn) => conn,
                        Err(e) => {
                            tracing::error!(listener = self.name, error = %e, "Accept failed");
                            tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                            continue;
                        }
                    };

                    if let Err(e) = socket.set_nodelay(true) {
                        tracing::warn!(listener = self.name, error = %e, "Failed to set TCP_NODELAY");
                    }

                    let router = self.router.clone();
                    let service = hyper::service::service_fn(move |request: hyper::Request<Incoming>| {
                        let mut router = router.clone();
                        let mut request = request.map(Body::new);
                        request.extensions_mut().insert(ConnectInfo(remote_addr));
                        async move { router.call(request).await }
                    });
                    let conn = builder.serve_connection_with_upgrades(TokioIo::new(socket), service);
                    let conn = graceful.watch(conn.into_owned());

                    let name = self.name;
                    connections.spawn(async move {
                        if let Err(e) = conn.await {
                            tracing::debug!(listener = name, error = %e, "Connection closed with error");
                        }
                    });
                }
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            tracing::warn!(listener = self.name, "Connection task panicked");
                        }
                    }
                }
                _ = &mut stop => {
                    tracing::info!(listener = self.name, "Stopped accepting connections");
                    break;
                }
            }
        }

        drop(listener);
        (graceful, connections)
    }
}

/// Connections left open after a listener stopped accepting.
pub struct Draining {
    name: &'static str,
    graceful: GracefulShutdown,
    connections: JoinSet<()>,
}

impl Draining {
    /// Connection tasks not yet reaped.
    pub fn open_connections(&self) -> usize {
        self.connections.len()
    }

    /// Ask every connection to finish its in-flight request, wait up to
    /// `deadline`, then abort whatever is still running.
    pub async fn finish(mut self, deadline: Duration) -> DrainOutcome {
        let open = self.connections.len();
        tracing::info!(
            listener = self.name,
            open_connections = open,
            deadline_ms = deadline.as_millis() as u64,
            "Draining connections"
        );

        match tokio::time::timeout(deadline, self.graceful.shutdown()).await {
            Ok(()) => {
                while self.connections.join_next().await.is_some() {}
                tracing::info!(listener = self.name, "All connections drained");
                DrainOutcome::Drained { connections: open }
            }
            Err(_) => {
                self.connections.abort_all();
                let mut aborted = 0;
                while let Some(joined) = self.connections.join_next().await {
                    if matches!(joined, Err(ref e) if e.is_cancelled()) {
                        aborted += 1;
                    }
                }
                tracing::warn!(
                    listener = self.name,
                    aborted,
                    "Shutdown deadline exceeded, closed remaining connections"
                );
                DrainOutcome::DeadlineExceeded { aborted }
            }
        }
    }
}
