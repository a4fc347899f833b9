//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command-line flags + VERSION environment variable
//!     → loader.rs (clap parse)
//!     → AppConfig (immutable for the process lifetime)
//!     → validation.rs (warnings only, logged at startup)
//!     → lifecycle::start
//! ```
//!
//! # Design Decisions
//! - Only the three addresses and the version are operator-facing
//! - Timers and the shutdown deadline have fixed defaults; tests shorten them
//! - An invalid address disables one listener, it never aborts the process

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::Cli;
pub use schema::{AppConfig, HandlerTimings};
pub use validation::{normalize_bind_address, validate_config, AddressError};
