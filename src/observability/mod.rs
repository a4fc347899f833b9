//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (log collection by the container runtime)
//!     → Metrics endpoint (Prometheus scrape on the metrics listener)
//! ```
//!
//! # Design Decisions
//! - Metrics registry is an explicit object, created before any listener
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;

pub use metrics::{InFlightGuard, MetricKind, MetricsError, MetricsRegistry, RequestMetrics};
