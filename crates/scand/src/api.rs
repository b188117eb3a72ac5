//! HTTP API: per-interface scan operations plus health checks and Prometheus metrics

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use scan_engine::{
    events::OffloadFailure,
    health::{ComponentStatus, HealthRegistry},
    sim::SimulatedOffload,
    EngineError, EngineRegistry, EngineStatus, PnoRequest, ScanEngine, ScanResult,
    SingleScanRequest,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EngineRegistry>,
    pub offloads: Arc<HashMap<String, Arc<SimulatedOffload>>>,
    pub health_registry: HealthRegistry,
}

impl AppState {
    pub fn new(
        registry: Arc<EngineRegistry>,
        offloads: Arc<HashMap<String, Arc<SimulatedOffload>>>,
        health_registry: HealthRegistry,
    ) -> Self {
        Self {
            registry,
            offloads,
            health_registry,
        }
    }

    fn engine(&self, interface: &str) -> Result<Arc<ScanEngine>, ApiError> {
        Ok(self.registry.get(interface)?)
    }
}

/// Outcome of a boolean boundary operation
#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Fault injection for the simulated offload engine
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OffloadFailRequest {
    /// Raise this asynchronous failure on the running offload scan
    pub reason: Option<OffloadFailure>,
    /// Make subsequent offload starts fail synchronously (or succeed again)
    pub reject_starts: Option<bool>,
    /// Report the offload engine as present or absent on later starts
    pub supported: Option<bool>,
}

/// Error body returned for failed lookups
pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            EngineError::UnknownInterface(_) => StatusCode::NOT_FOUND,
            EngineError::DuplicateInterface(_) => StatusCode::CONFLICT,
            EngineError::MissingComponent(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (
            status,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

async fn list_interfaces(State(state): State<Arc<AppState>>) -> Json<Vec<EngineStatus>> {
    Json(state.registry.statuses().await)
}

async fn scan(
    State(state): State<Arc<AppState>>,
    Path(iface): Path<String>,
    Json(request): Json<SingleScanRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let engine = state.engine(&iface)?;
    let ok = engine.scan(&request).await;
    Ok(Json(OkResponse { ok }))
}

async fn abort_scan(
    State(state): State<Arc<AppState>>,
    Path(iface): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    let engine = state.engine(&iface)?;
    let ok = engine.abort_scan().await;
    Ok(Json(OkResponse { ok }))
}

async fn scan_results(
    State(state): State<Arc<AppState>>,
    Path(iface): Path<String>,
) -> Result<Json<Vec<ScanResult>>, ApiError> {
    let engine = state.engine(&iface)?;
    Ok(Json(engine.get_scan_results().await))
}

async fn start_pno(
    State(state): State<Arc<AppState>>,
    Path(iface): Path<String>,
    Json(request): Json<PnoRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let engine = state.engine(&iface)?;
    let ok = engine.start_pno_scan(request).await;
    Ok(Json(OkResponse { ok }))
}

async fn stop_pno(
    State(state): State<Arc<AppState>>,
    Path(iface): Path<String>,
) -> Result<Json<OkResponse>, ApiError> {
    let engine = state.engine(&iface)?;
    let ok = engine.stop_pno_scan().await;
    Ok(Json(OkResponse { ok }))
}

async fn pno_results(
    State(state): State<Arc<AppState>>,
    Path(iface): Path<String>,
) -> Result<Json<Vec<ScanResult>>, ApiError> {
    let engine = state.engine(&iface)?;
    Ok(Json(engine.get_pno_scan_results().await))
}

async fn fail_offload(
    State(state): State<Arc<AppState>>,
    Path(iface): Path<String>,
    Json(request): Json<OffloadFailRequest>,
) -> Result<Json<OkResponse>, ApiError> {
    let offload = state
        .offloads
        .get(&iface)
        .ok_or_else(|| EngineError::UnknownInterface(iface.clone()))?;

    if let Some(reject) = request.reject_starts {
        info!(interface = %iface, reject, "Setting simulated offload start rejection");
        offload.set_reject_starts(reject);
    }
    if let Some(supported) = request.supported {
        info!(interface = %iface, supported, "Setting simulated offload availability");
        offload.set_supported(supported);
    }
    if let Some(reason) = request.reason {
        offload.inject_error(reason);
    }
    Ok(Json(OkResponse { ok: true }))
}

/// Health check response - returns 200 if healthy, 503 if degraded/unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Degraded => StatusCode::OK, // Still operational
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/v1/interfaces", get(list_interfaces))
        .route("/v1/interfaces/:iface/scan", post(scan))
        .route("/v1/interfaces/:iface/scan/abort", post(abort_scan))
        .route("/v1/interfaces/:iface/scan/results", get(scan_results))
        .route("/v1/interfaces/:iface/pno/start", post(start_pno))
        .route("/v1/interfaces/:iface/pno/stop", post(stop_pno))
        .route("/v1/interfaces/:iface/pno/results", get(pno_results))
        .route("/v1/interfaces/:iface/offload/fail", post(fail_offload))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
