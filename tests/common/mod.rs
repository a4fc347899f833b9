//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use probe_app::config::HandlerTimings;
use probe_app::observability::{MetricsRegistry, RequestMetrics};
use probe_app::AppConfig;

/// Configuration with every listener on an ephemeral loopback port.
pub fn local_config(version: &str) -> AppConfig {
    AppConfig {
        listen_address: "127.0.0.1:0".into(),
        check_address: Some("127.0.0.1:0".into()),
        metrics_address: "127.0.0.1:0".into(),
        version: version.into(),
        shutdown_deadline: Duration::from_secs(5),
        timings: HandlerTimings {
            load_window: Duration::from_millis(50),
            delay: Duration::from_millis(50),
        },
    }
}

/// A fresh registry with the request metrics registered.
pub fn request_metrics(version: &str) -> RequestMetrics {
    let registry = Arc::new(MetricsRegistry::new(version).unwrap());
    RequestMetrics::register(registry).unwrap()
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

/// GET `path` on `addr`, returning status and body.
pub async fn get(addr: SocketAddr, path: &str) -> reqwest::Result<(u16, String)> {
    let response = client()
        .get(format!("http://{}{}", addr, path))
        .send()
        .await?;
    let status = response.status().as_u16();
    let body = response.text().await?;
    Ok((status, body))
}

/// Value of the first sample named `name` carrying every label in `labels`.
pub fn sample(rendered: &str, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    rendered
        .lines()
        .filter(|line| !line.starts_with('#'))
        .filter(|line| {
            line.strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('{') || rest.starts_with(' '))
        })
        .find(|line| {
            labels
                .iter()
                .all(|(k, v)| line.contains(&format!("{}=\"{}\"", k, v)))
        })
        .and_then(|line| line.rsplit(' ').next())
        .and_then(|value| value.parse().ok())
}

/// Poll `check` until it returns true or `timeout` passes.
pub async fn wait_for<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
