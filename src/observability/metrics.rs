//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Own the Prometheus recorder for the whole process
//! - Register each metric name exactly once
//! - Define the request metrics recorded by the instrumentation layer
//! - Render the text exposition served on `/metrics`
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by code, method
//! - `in_flight_requests` (gauge): requests currently being served
//! - `request_duration_seconds` (histogram): latency by code, method
//! - `response_size_bytes` (histogram): body size by code, method
//!
//! Every metric carries the constant `version` label.
//!
//! # Design Decisions
//! - The recorder is never installed globally; the registry is passed around
//! - Bucket boundaries are fixed so existing dashboards keep working
//! - All updates are atomic, callers never lock

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::http::{Method, StatusCode};
use metrics::{Counter, Gauge, Histogram, Key, KeyName, Label, Level, Metadata, Recorder};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};
use thiserror::Error;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const IN_FLIGHT_REQUESTS: &str = "in_flight_requests";
pub const REQUEST_DURATION_SECONDS: &str = "request_duration_seconds";
pub const RESPONSE_SIZE_BYTES: &str = "response_size_bytes";

/// Latency buckets in seconds.
pub const DURATION_BUCKETS: &[f64] = &[0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Response size buckets in bytes.
pub const SIZE_BUCKETS: &[f64] = &[200.0, 500.0, 900.0, 1500.0];

/// Constant label attached to every metric.
pub const VERSION_LABEL: &str = "version";

/// Errors raised while building or filling the registry.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("metric {0} is already registered")]
    Duplicate(&'static str),

    #[error("invalid metrics exporter configuration: {0}")]
    Build(#[from] BuildError),
}

/// Kind of a registered metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Histogram,
}

fn metadata() -> Metadata<'static> {
    Metadata::new(module_path!(), Level::INFO, Some(module_path!()))
}

/// Process-wide metric registry backed by a Prometheus recorder.
pub struct MetricsRegistry {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
    registered: Mutex<HashMap<&'static str, MetricKind>>,
}

impl MetricsRegistry {
    /// Build a registry whose metrics all carry `version="<version>"`.
    pub fn new(version: &str) -> Result<Self, MetricsError> {
        let recorder = PrometheusBuilder::new()
            .add_global_label(VERSION_LABEL, version)
            .set_buckets_for_metric(
                Matcher::Full(REQUEST_DURATION_SECONDS.to_string()),
                DURATION_BUCKETS,
            )?
            .set_buckets_for_metric(
                Matcher::Full(RESPONSE_SIZE_BYTES.to_string()),
                SIZE_BUCKETS,
            )?
            .build_recorder();
        let handle = recorder.handle();

        Ok(Self {
            recorder,
            handle,
            registered: Mutex::new(HashMap::new()),
        })
    }

    /// Register a metric name with its help text.
    ///
    /// Registering the same name twice is a configuration error.
    pub fn register(
        &self,
        name: &'static str,
        kind: MetricKind,
        help: &'static str,
    ) -> Result<(), MetricsError> {
        let mut registered = self
            .registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if registered.contains_key(name) {
            return Err(MetricsError::Duplicate(name));
        }
        registered.insert(name, kind);
        drop(registered);

        let key = KeyName::from(name);
        match kind {
            MetricKind::Counter => self.recorder.describe_counter(key, None, help.into()),
            MetricKind::Gauge => self.recorder.describe_gauge(key, None, help.into()),
            MetricKind::Histogram => self.recorder.describe_histogram(key, None, help.into()),
        }
        tracing::debug!(metric = name, kind = ?kind, "Metric registered");
        Ok(())
    }

    /// Whether `name` has been registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.registered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn counter(&self, name: &'static str, labels: Vec<Label>) -> Counter {
        self.recorder
            .register_counter(&Key::from_parts(name, labels), &metadata())
    }

    pub fn gauge(&self, name: &'static str, labels: Vec<Label>) -> Gauge {
        self.recorder
            .register_gauge(&Key::from_parts(name, labels), &metadata())
    }

    pub fn histogram(&self, name: &'static str, labels: Vec<Label>) -> Histogram {
        self.recorder
            .register_histogram(&Key::from_parts(name, labels), &metadata())
    }

    /// Render every metric in the Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// The request metric family shared by every instrumented request.
#[derive(Clone)]
pub struct RequestMetrics {
    registry: Arc<MetricsRegistry>,
    in_flight: Gauge,
}

impl RequestMetrics {
    /// Register the four request metrics. Must run before any listener starts.
    pub fn register(registry: Arc<MetricsRegistry>) -> Result<Self, MetricsError> {
        registry.register(
            HTTP_REQUESTS_TOTAL,
            MetricKind::Counter,
            "A counter for received requests",
        )?;
        registry.register(
            IN_FLIGHT_REQUESTS,
            MetricKind::Gauge,
            "A gauge of requests currently being served",
        )?;
        registry.register(
            REQUEST_DURATION_SECONDS,
            MetricKind::Histogram,
            "A histogram of latencies for requests",
        )?;
        registry.register(
            RESPONSE_SIZE_BYTES,
            MetricKind::Histogram,
            "A histogram of response sizes for requests",
        )?;

        let in_flight = registry.gauge(IN_FLIGHT_REQUESTS, Vec::new());
        in_flight.set(0.0);

        Ok(Self {
            registry,
            in_flight,
        })
    }

    pub fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.registry
    }

    /// Count a request as in flight until the returned guard drops.
    pub fn track_in_flight(&self) -> InFlightGuard {
        self.in_flight.increment(1.0);
        InFlightGuard {
            gauge: self.in_flight.clone(),
        }
    }

    /// Record one completed request.
    pub fn observe(
        &self,
        method: &Method,
        status: StatusCode,
        elapsed: Duration,
        response_bytes: u64,
    ) {
        let labels = vec![
            Label::new("code", status.as_u16().to_string()),
            Label::new("method", method_label(method)),
        ];

        self.registry
            .counter(HTTP_REQUESTS_TOTAL, labels.clone())
            .increment(1);
        self.registry
            .histogram(REQUEST_DURATION_SECONDS, labels.clone())
            .record(elapsed.as_secs_f64());
        self.registry
            .histogram(RESPONSE_SIZE_BYTES, labels)
            .record(response_bytes as f64);
    }
}

/// Lower-case method name, the label convention of the Go client library.
fn method_label(method: &Method) -> String {
    method.as_str().to_ascii_lowercase()
}

/// Holds one unit of the in-flight gauge. Decrements on drop.
#[must_use = "the request stops counting as in flight when the guard drops"]
pub struct InFlightGuard {
    gauge: Gauge,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.gauge.decrement(1.0);
    }
}
