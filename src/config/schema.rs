//! Configuration schema definitions.
//!
//! The process-wide configuration is built once at startup and never changes.

use std::time::Duration;

/// Default application traffic address.
pub const DEFAULT_LISTEN_ADDRESS: &str = ":8080";

/// Default dedicated health-check address.
pub const DEFAULT_CHECK_ADDRESS: &str = ":8090";

/// Default metrics-scrape address.
pub const DEFAULT_METRICS_ADDRESS: &str = ":9090";

/// Deadline for draining the application listener on shutdown.
pub const DEFAULT_SHUTDOWN_DEADLINE: Duration = Duration::from_secs(5);

/// Busy window of the `/load` handler and sleep of the `/delay` handler.
pub const DEFAULT_HANDLER_WINDOW: Duration = Duration::from_secs(10);

/// Root configuration for the service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application traffic bind address (e.g., ":8080").
    pub listen_address: String,

    /// Dedicated health-check bind address.
    ///
    /// `None` folds `/ready` and `/live` into the application router.
    pub check_address: Option<String>,

    /// Metrics endpoint bind address.
    pub metrics_address: String,

    /// Build/version string, echoed in responses and attached to metrics.
    pub version: String,

    /// How long the application listener may drain on shutdown.
    pub shutdown_deadline: Duration,

    /// Timers used by the artificial load and delay handlers.
    pub timings: HandlerTimings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_address: DEFAULT_LISTEN_ADDRESS.to_string(),
            check_address: Some(DEFAULT_CHECK_ADDRESS.to_string()),
            metrics_address: DEFAULT_METRICS_ADDRESS.to_string(),
            version: String::new(),
            shutdown_deadline: DEFAULT_SHUTDOWN_DEADLINE,
            timings: HandlerTimings::default(),
        }
    }
}

/// Fixed timers of the demo handlers.
///
/// Neither timer observes client disconnects or process shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerTimings {
    /// How long `/load` keeps every CPU busy.
    pub load_window: Duration,

    /// How long `/delay` sleeps before answering.
    pub delay: Duration,
}

impl Default for HandlerTimings {
    fn default() -> Self {
        Self {
            load_window: DEFAULT_HANDLER_WINDOW,
            delay: DEFAULT_HANDLER_WINDOW,
        }
    }
}
