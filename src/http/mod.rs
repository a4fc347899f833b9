//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net::Listener)
//!     → server.rs (hyper-util connection, ConnectInfo, graceful drain)
//!     → routes.rs (app / health / metrics routers)
//!     → middleware/metrics.rs (instrumentation, app router only)
//!     → handlers.rs (echo, probes, load, delay)
//!     → Send to client
//! ```

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use handlers::AppState;
pub use server::{DrainOutcome, Draining, HttpServer};
