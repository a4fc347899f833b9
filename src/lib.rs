//! Probe App
//!
//! A small HTTP workload for exercising deployment pipelines: rolling
//! updates, liveness and readiness probes, Prometheus scrapes and graceful
//! termination.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!   app traffic   │  net::Listener ─▶ http::server ─▶ instrument │
//!  ───────────────┼─▶ (":8080")        (drains)        ─▶ echo   │
//!                 │                                   load/delay │
//!   probes        │  net::Listener ─▶ http::server ─▶ ready/live │
//!  ───────────────┼─▶ (":8090")        (aborted)                 │
//!                 │                                              │
//!   scrapes       │  net::Listener ─▶ http::server ─▶ /metrics   │
//!  ───────────────┼─▶ (":9090")        (aborted)                 │
//!                 │                                              │
//!                 │  lifecycle: signals ─▶ shutdown (5s deadline)│
//!                 └──────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod net;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
