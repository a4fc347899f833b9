//! End-to-end tests of the three listeners over real sockets.

use std::time::Duration;

use probe_app::lifecycle::start;
use probe_app::AppConfig;

mod common;

#[tokio::test]
async fn echo_reports_version_and_caller() {
    let running = start(&common::local_config("3.2.1"), common::request_metrics("3.2.1")).await;
    let app = running.app_addr().unwrap();

    let (status, body) = common::get(app, "/").await.unwrap();

    assert_eq!(status, 200);
    let lines: Vec<_> = body.lines().collect();
    assert_eq!(lines.len(), 3, "unexpected body: {body}");
    assert!(lines[0].starts_with("Server name: "));
    assert_eq!(lines[1], "Server version: 3.2.1");
    assert_eq!(lines[2], "Remote client address: 127.0.0.1");

    running.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn probes_answer_on_health_listener() {
    let running = start(&common::local_config("v1"), common::request_metrics("v1")).await;
    let health = running.health_addr().unwrap();

    assert_eq!(common::get(health, "/live").await.unwrap(), (200, "ok".into()));
    assert_eq!(common::get(health, "/ready").await.unwrap(), (200, "ok".into()));
    assert_eq!(common::get(health, "/").await.unwrap().0, 404);

    running.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn probes_fold_into_app_listener_without_check_address() {
    let config = AppConfig {
        check_address: None,
        ..common::local_config("v1")
    };
    let running = start(&config, common::request_metrics("v1")).await;
    let app = running.app_addr().unwrap();

    assert!(running.health_addr().is_none());
    assert_eq!(common::get(app, "/live").await.unwrap(), (200, "ok".into()));
    assert_eq!(common::get(app, "/ready").await.unwrap(), (200, "ok".into()));

    running.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn metrics_listener_exposes_request_metrics() {
    let running = start(&common::local_config("4.0.0"), common::request_metrics("4.0.0")).await;
    let app = running.app_addr().unwrap();
    let scrape = running.metrics_addr().unwrap();

    common::get(app, "/").await.unwrap();
    common::get(app, "/delay").await.unwrap();
    let labels = [("code", "200"), ("method", "get"), ("version", "4.0.0")];
    let counted = common::wait_for(Duration::from_secs(1), move || async move {
        let (_, text) = common::get(scrape, "/metrics").await.unwrap();
        common::sample(&text, "http_requests_total", &labels) == Some(2.0)
    })
    .await;
    assert!(counted, "both requests should be counted");

    let (status, text) = common::get(scrape, "/metrics").await.unwrap();
    assert_eq!(status, 200);
    for name in [
        "http_requests_total",
        "in_flight_requests",
        "request_duration_seconds",
        "response_size_bytes",
    ] {
        assert!(text.contains(&format!("# TYPE {name}")), "missing {name}");
    }
    assert_eq!(common::sample(&text, "in_flight_requests", &[]), Some(0.0));

    running.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn probe_and_scrape_traffic_is_not_counted() {
    let running = start(&common::local_config("v1"), common::request_metrics("v1")).await;
    let health = running.health_addr().unwrap();
    let scrape = running.metrics_addr().unwrap();

    common::get(health, "/live").await.unwrap();
    common::get(scrape, "/metrics").await.unwrap();
    let (_, text) = common::get(scrape, "/metrics").await.unwrap();

    assert_eq!(common::sample(&text, "http_requests_total", &[]), None);

    running.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn in_flight_gauge_tracks_slow_requests() {
    let mut config = common::local_config("v1");
    config.timings.delay = Duration::from_millis(600);
    let running = start(&config, common::request_metrics("v1")).await;
    let app = running.app_addr().unwrap();
    let scrape = running.metrics_addr().unwrap();

    let slow = tokio::spawn(async move { common::get(app, "/delay").await });

    let seen = common::wait_for(Duration::from_millis(500), move || async move {
        let (_, text) = common::get(scrape, "/metrics").await.unwrap();
        common::sample(&text, "in_flight_requests", &[]) == Some(1.0)
    })
    .await;
    assert!(seen, "gauge never reached 1 while /delay was running");

    assert_eq!(slow.await.unwrap().unwrap(), (200, "ok".into()));
    let released = common::wait_for(Duration::from_secs(1), move || async move {
        let (_, text) = common::get(scrape, "/metrics").await.unwrap();
        common::sample(&text, "in_flight_requests", &[]) == Some(0.0)
    })
    .await;
    assert!(released, "gauge should return to 0");

    running.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn load_reports_every_cpu() {
    let running = start(&common::local_config("v1"), common::request_metrics("v1")).await;
    let app = running.app_addr().unwrap();
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);

    let (status, body) = common::get(app, "/load").await.unwrap();

    assert_eq!(status, 200);
    assert_eq!(body.lines().count(), cpus);
    assert!(body.starts_with("Loading CPU: 0\n"));

    running.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn taken_port_disables_only_that_listener() {
    let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let config = AppConfig {
        check_address: Some(taken.local_addr().unwrap().to_string()),
        ..common::local_config("v1")
    };

    let running = start(&config, common::request_metrics("v1")).await;

    assert!(running.health_addr().is_none());
    let app = running.app_addr().unwrap();
    let scrape = running.metrics_addr().unwrap();
    assert_eq!(common::get(app, "/").await.unwrap().0, 200);
    assert_eq!(common::get(scrape, "/metrics").await.unwrap().0, 200);

    running.shutdown(Duration::from_secs(1)).await;
}

#[tokio::test]
async fn non_get_methods_are_echoed() {
    let running = start(&common::local_config("v1"), common::request_metrics("v1")).await;
    let app = running.app_addr().unwrap();

    let response = common::client()
        .post(format!("http://{}/", app))
        .body("hello")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert!(response.text().await.unwrap().starts_with("Server name: "));

    running.shutdown(Duration::from_secs(1)).await;
}
