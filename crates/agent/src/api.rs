//! HTTP API for estimates, allocation, health checks and Prometheus metrics

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use energy_agent_lib::{
    allocator::{AllocationError, WorkloadAllocator},
    estimation::EstimationEngine,
    health::{ComponentStatus, HealthRegistry},
    models::{UtilizationSample, WorkloadRequest},
    observability::{AgentMetrics, MetricsSink, StructuredLogger},
    store::EstimateStore,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: AgentMetrics,
    pub engine: Arc<EstimationEngine>,
    pub store: Arc<EstimateStore>,
    pub allocator: Arc<WorkloadAllocator>,
    pub logger: StructuredLogger,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

fn error_response(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
            code,
        }),
    )
        .into_response()
}

/// Malformed or incomplete JSON body
fn invalid_request(rejection: JsonRejection) -> Response {
    error_response(rejection.status(), "invalid_request", rejection.body_text())
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
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
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.encode() {
        Ok(buffer) => (
            StatusCode::OK,
            [("content-type", prometheus::TEXT_FORMAT)],
            buffer,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "metrics_unavailable",
                e.to_string(),
            )
        }
    }
}

/// GET /api/v1/energy
async fn list_energy(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.store.list())
}

/// GET /api/v1/energy/:instance_id
async fn get_energy(
    State(state): State<Arc<AppState>>,
    Path(instance_id): Path<String>,
) -> Response {
    match state.store.get(&instance_id) {
        Some(result) => Json(result).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            "instance_not_found",
            format!("Instance not found: {}", instance_id),
        ),
    }
}

/// POST /api/v1/estimate
async fn estimate(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Vec<UtilizationSample>>, JsonRejection>,
) -> Response {
    let Json(samples) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_request(rejection),
    };
    let results = state.engine.estimate_all(&samples);
    for result in &results {
        state.logger.log_estimate(result);
    }
    Json(results).into_response()
}

/// GET /api/v1/sustainability/:region
async fn sustainability(
    State(state): State<Arc<AppState>>,
    Path(region): Path<String>,
) -> impl IntoResponse {
    let sustainability = state.engine.sustainability(&region);
    state.metrics.record_sustainability(&sustainability);
    Json(sustainability)
}

/// POST /api/v1/workloads/allocate
async fn allocate_workload(
    State(state): State<Arc<AppState>>,
    body: Result<Json<WorkloadRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return invalid_request(rejection),
    };
    match state.allocator.allocate(&request).await {
        Ok(decision) => {
            state.allocator.scale_action(decision.energy_consumption);
            Json(decision).into_response()
        }
        Err(e @ AllocationError::NoCandidates(_)) => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, "no_candidates", e.to_string())
        }
        Err(e @ AllocationError::Source(_)) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "allocation_failed",
            e.to_string(),
        ),
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/api/v1/energy", get(list_energy))
        .route("/api/v1/energy/:instance_id", get(get_energy))
        .route("/api/v1/estimate", post(estimate))
        .route("/api/v1/sustainability/:region", get(sustainability))
        .route("/api/v1/workloads/allocate", post(allocate_workload))
        .with_state(state)
}

/// Serve the API on an already bound listener
pub async fn serve_listener(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = TcpListener::bind(&addr).await?;
    serve_listener(listener, state).await
}
