//! Integration tests for the daemon API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use scan_engine::{
    health::{components, HealthRegistry},
    ScanMetrics, SchedulePolicy,
};
use scand::{
    api::{create_router, AppState},
    config::{default_interface, DaemonConfig},
    daemon::Daemon,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_config() -> DaemonConfig {
    DaemonConfig {
        node_name: "test-node".to_string(),
        api_port: 0,
        schedule: SchedulePolicy::default(),
        interfaces: vec![default_interface()],
    }
}

async fn setup_test_app() -> (Router, Arc<AppState>, Daemon) {
    let health_registry = HealthRegistry::new();
    let daemon = Daemon::start(&test_config(), health_registry.clone())
        .await
        .unwrap();

    let state = Arc::new(AppState::new(
        daemon.registry.clone(),
        daemon.offloads.clone(),
        health_registry,
    ));
    let router = create_router(state.clone());

    (router, state, daemon)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

async fn wait_for_backend(app: &Router, backend: &str) -> bool {
    for _ in 0..100 {
        let (_, body) = get(app, "/v1/interfaces").await;
        if body[0]["pno_backend"] == backend {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state, daemon) = setup_test_app().await;

    let (status, health) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["wlan0/scanner"].is_object());
    assert!(health["components"]["wlan0/pno"].is_object());
    assert!(health["components"]["wlan0/offload"].is_object());

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_healthz_returns_ok_when_degraded() {
    let (app, state, daemon) = setup_test_app().await;

    state
        .health_registry
        .set_degraded(&components::for_interface("wlan0", components::OFFLOAD), "offload lost")
        .await;

    // Degraded still returns 200 (operational)
    let (status, health) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_healthz_returns_503_when_unhealthy() {
    let (app, state, daemon) = setup_test_app().await;

    state
        .health_registry
        .set_unhealthy(&components::for_interface("wlan0", components::SCANNER), "device removed")
        .await;

    let (status, health) = get(&app, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_readyz_follows_ready_flag() {
    let (app, state, daemon) = setup_test_app().await;

    let (status, readiness) = get(&app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);

    state.health_registry.set_ready(true).await;
    let (status, readiness) = get(&app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_list_interfaces() {
    let (app, _state, daemon) = setup_test_app().await;

    let (status, body) = get(&app, "/v1/interfaces").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["interface"], "wlan0");
    assert_eq!(body[0]["interface_index"], 12);
    assert_eq!(body[0]["pno_backend"], "none");
    assert_eq!(body[0]["defunct"], false);

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_unknown_interface_returns_404() {
    let (app, _state, daemon) = setup_test_app().await;

    let (status, body) = post(&app, "/v1/interfaces/wlan9/scan", json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown interface: wlan9");

    let (status, _) = get(&app, "/v1/interfaces/wlan9/pno/results").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(
        &app,
        "/v1/interfaces/wlan9/offload/fail",
        json!({"reason": "service_died"}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_scan_then_results() {
    let (app, _state, daemon) = setup_test_app().await;

    let (status, body) = post(
        &app,
        "/v1/interfaces/wlan0/scan",
        json!({"scan_type": "low_power", "ssids": ["Hidden"], "randomize_mac": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, body) = post(&app, "/v1/interfaces/wlan0/scan/abort", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);

    let (status, results) = get(&app, "/v1/interfaces/wlan0/scan/results").await;
    assert_eq!(status, StatusCode::OK);
    let results = results.as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["ssid"], "HomeNetwork");
    assert_eq!(results[0]["signal_dbm"], -48);

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_pno_lifecycle_with_offload_failover() {
    let (app, state, daemon) = setup_test_app().await;

    let (status, body) = post(
        &app,
        "/v1/interfaces/wlan0/pno/start",
        json!({"interval_ms": 20, "match_ssids": ["HomeNetwork"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(wait_for_backend(&app, "offload").await);

    let (status, body) = post(
        &app,
        "/v1/interfaces/wlan0/offload/fail",
        json!({"reason": "service_died"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(wait_for_backend(&app, "netlink").await);

    let (_, health) = get(&app, "/healthz").await;
    assert_eq!(health["components"]["wlan0/offload"]["status"], "degraded");
    assert_eq!(
        state
            .health_registry
            .status_of(&components::for_interface("wlan0", components::PNO))
            .await,
        Some(scan_engine::ComponentStatus::Healthy)
    );

    let (status, body) = post(&app, "/v1/interfaces/wlan0/pno/stop", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(wait_for_backend(&app, "none").await);

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_pno_falls_back_when_offload_rejects() {
    let (app, _state, daemon) = setup_test_app().await;

    let (status, _) = post(
        &app,
        "/v1/interfaces/wlan0/offload/fail",
        json!({"reject_starts": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = post(
        &app,
        "/v1/interfaces/wlan0/pno/start",
        json!({"interval_ms": 20}),
    )
    .await;
    assert_eq!(body["ok"], true);
    assert!(wait_for_backend(&app, "netlink").await);

    let mut buffered = false;
    for _ in 0..100 {
        let (_, results) = get(&app, "/v1/interfaces/wlan0/pno/results").await;
        if !results.as_array().unwrap().is_empty() {
            buffered = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(buffered);

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_offload_availability_checked_on_each_start() {
    let (app, _state, daemon) = setup_test_app().await;

    let (status, _) = post(
        &app,
        "/v1/interfaces/wlan0/offload/fail",
        json!({"supported": false}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = post(
        &app,
        "/v1/interfaces/wlan0/pno/start",
        json!({"interval_ms": 20}),
    )
    .await;
    assert_eq!(body["ok"], true);
    assert!(wait_for_backend(&app, "netlink").await);

    let (_, body) = post(&app, "/v1/interfaces/wlan0/pno/stop", json!({})).await;
    assert_eq!(body["ok"], true);

    post(
        &app,
        "/v1/interfaces/wlan0/offload/fail",
        json!({"supported": true}),
    )
    .await;
    let (_, body) = post(
        &app,
        "/v1/interfaces/wlan0/pno/start",
        json!({"interval_ms": 20}),
    )
    .await;
    assert_eq!(body["ok"], true);
    assert!(wait_for_backend(&app, "offload").await);

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_pno_start_rejects_zero_interval() {
    let (app, _state, daemon) = setup_test_app().await;

    let (status, body) = post(
        &app,
        "/v1/interfaces/wlan0/pno/start",
        json!({"interval_ms": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], false);

    daemon.shutdown().await;
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, _state, daemon) = setup_test_app().await;

    ScanMetrics::new().observe_scan_dispatch_latency(0.001);
    let (_, body) = post(&app, "/v1/interfaces/wlan0/scan", json!({})).await;
    assert_eq!(body["ok"], true);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("scan_engine_scan_dispatch_latency_seconds_bucket"));
    assert!(metrics_text.contains("scan_engine_scans_requested_total"));

    daemon.shutdown().await;
}
