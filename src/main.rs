use std::sync::Arc;

use probe_app::config::Cli;
use probe_app::lifecycle::{self, TerminationListener};
use probe_app::observability::{logging, MetricsRegistry, RequestMetrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Cli::load();
    tracing::info!(version = %config.version, "Web App Version");
    tracing::info!(
        listen = %config.listen_address,
        check = config.check_address.as_deref().unwrap_or(""),
        metrics = %config.metrics_address,
        "Configuration loaded"
    );

    // Metrics must be registered before any listener accepts traffic.
    let registry = Arc::new(MetricsRegistry::new(&config.version)?);
    let metrics = RequestMetrics::register(registry)?;

    let termination = TerminationListener::install()?;

    lifecycle::run(&config, metrics, async move {
        termination.recv().await;
    })
    .await;

    Ok(())
}
