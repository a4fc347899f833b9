//! TCP listener implementation.
//!
//! # Responsibilities
//! - Normalize and bind the configured address
//! - Accept incoming TCP connections
//! - Report bind failures with the listener's name attached

use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};

use crate::config::validation::{normalize_bind_address, AddressError};

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The configured address could not be understood.
    #[error("invalid address {address:?} for {name} listener: {source}")]
    InvalidAddress {
        name: &'static str,
        address: String,
        source: AddressError,
    },

    /// Failed to bind to address.
    #[error("failed to bind {name} listener on {address}: {source}")]
    Bind {
        name: &'static str,
        address: String,
        source: std::io::Error,
    },

    /// Failed to accept connection.
    #[error("failed to accept: {0}")]
    Accept(std::io::Error),
}

/// A bound TCP endpoint owned by exactly one serving task.
#[derive(Debug)]
pub struct Listener {
    name: &'static str,
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind to the given host:port address.
    pub async fn bind(name: &'static str, address: &str) -> Result<Self, ListenerError> {
        let normalized =
            normalize_bind_address(address).map_err(|source| ListenerError::InvalidAddress {
                name,
                address: address.to_string(),
                source,
            })?;

        let inner = TcpListener::bind(normalized.as_str())
            .await
            .map_err(|source| ListenerError::Bind {
                name,
                address: normalized.clone(),
                source,
            })?;

        let local_addr = inner.local_addr().map_err(|source| ListenerError::Bind {
            name,
            address: normalized,
            source,
        })?;

        tracing::info!(
            listener = name,
            address = %local_addr,
            "Listener bound"
        );

        Ok(Self {
            name,
            inner,
            local_addr,
        })
    }

    /// Accept a new connection.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::trace!(
            listener = self.name,
            peer_addr = %addr,
            "Connection accepted"
        );

        Ok((stream, addr))
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Name used in logs ("app", "health", "metrics").
    pub fn name(&self) -> &'static str {
        self.name
    }
}
