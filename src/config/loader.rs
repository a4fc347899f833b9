//! Configuration loading from command-line flags and the environment.

use clap::Parser;

use crate::config::schema::{
    AppConfig, DEFAULT_CHECK_ADDRESS, DEFAULT_LISTEN_ADDRESS, DEFAULT_METRICS_ADDRESS,
};

/// Command-line interface of the service.
#[derive(Debug, Parser)]
#[command(name = "probe-app")]
#[command(about = "Demo HTTP workload for rollout, probe and scrape testing", long_about = None)]
pub struct Cli {
    /// The address to listen on for web requests
    #[arg(long, default_value = DEFAULT_LISTEN_ADDRESS)]
    pub listen: String,

    /// The address to listen on for health checks (empty serves them on --listen)
    #[arg(long, default_value = DEFAULT_CHECK_ADDRESS)]
    pub check: String,

    /// The address to listen on for metric pulls
    #[arg(long, visible_alias = "metrics", default_value = DEFAULT_METRICS_ADDRESS)]
    pub metric: String,

    /// Version string reported in responses and metric labels
    #[arg(long, env = "VERSION", default_value = "", hide_env_values = true)]
    pub version: String,
}

impl Cli {
    /// Parse the process arguments into a configuration.
    pub fn load() -> AppConfig {
        Self::parse().into_config()
    }

    /// Convert parsed flags into the immutable runtime configuration.
    pub fn into_config(self) -> AppConfig {
        let check_address = match self.check.trim() {
            "" => None,
            addr => Some(addr.to_string()),
        };

        AppConfig {
            listen_address: self.listen,
            check_address,
            metrics_address: self.metric,
            version: self.version,
            ..AppConfig::default()
        }
    }
}
