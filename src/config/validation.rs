//! Configuration validation.
//!
//! # Responsibilities
//! - Normalize host:port bind addresses (":8080" means all interfaces)
//! - Report suspicious but non-fatal settings
//!
//! # Design Decisions
//! - Nothing here aborts startup: a bad address only disables its listener
//! - Warnings are returned, the caller decides how to log them

use thiserror::Error;

use crate::config::schema::AppConfig;

/// Why a bind address was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("address is empty")]
    Empty,

    #[error("missing port in address {0:?}")]
    MissingPort(String),

    #[error("invalid port in address {0:?}")]
    InvalidPort(String),
}

/// Turn a host:port string into something `TcpListener::bind` resolves.
///
/// An empty host binds every IPv4 interface. Bracketed IPv6 hosts are kept.
pub fn normalize_bind_address(addr: &str) -> Result<String, AddressError> {
    let addr = addr.trim();
    if addr.is_empty() {
        return Err(AddressError::Empty);
    }

    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| AddressError::MissingPort(addr.to_string()))?;

    if port.is_empty() {
        return Err(AddressError::MissingPort(addr.to_string()));
    }
    port.parse::<u16>()
        .map_err(|_| AddressError::InvalidPort(addr.to_string()))?;

    if host.is_empty() {
        Ok(format!("0.0.0.0:{}", port))
    } else {
        Ok(addr.to_string())
    }
}

/// A setting that will not stop the process but is probably a mistake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Collect every warning for the given configuration.
pub fn validate_config(config: &AppConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    let mut named: Vec<(&str, &str)> = vec![
        ("app", config.listen_address.as_str()),
        ("metrics", config.metrics_address.as_str()),
    ];
    if let Some(check) = config.check_address.as_deref() {
        named.push(("health", check));
    }

    for (name, addr) in &named {
        if let Err(e) = normalize_bind_address(addr) {
            warnings.push(ConfigWarning {
                message: format!("{} listener will not start: {}", name, e),
            });
        }
    }

    for (i, (first, a)) in named.iter().enumerate() {
        for (second, b) in named.iter().skip(i + 1) {
            let same = match (normalize_bind_address(a), normalize_bind_address(b)) {
                (Ok(a), Ok(b)) => a == b && !a.ends_with(":0"),
                _ => false,
            };
            if same {
                warnings.push(ConfigWarning {
                    message: format!(
                        "{} and {} listeners share address {}; one will fail to bind",
                        first, second, a
                    ),
                });
            }
        }
    }

    warnings
}
