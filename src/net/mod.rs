//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! configured host:port
//!     → listener.rs (normalize, bind, accept loop source)
//!     → Hand off to HTTP layer (http::server)
//! ```
//!
//! # Design Decisions
//! - Each listener is bound independently; one failure leaves the others up
//! - The listener is moved into its serving task and dropped when it stops

pub mod listener;

pub use listener::{Listener, ListenerError};
