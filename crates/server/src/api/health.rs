use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use utoipa::ToSchema;

use super::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub error: &'static str,
}

/// `GET /healthz`: always `200 {"status":"ok","error":""}` once the
/// server is accepting connections.
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "Health",
    responses((status = 200, description = "Server is healthy", body = HealthResponse))
)]
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok", error: "" }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MetricsResponse {
    pub reservations_granted: u64,
    pub releases: u64,
    pub drains_started: u64,
    pub drains_completed: u64,
    pub drains_failed: u64,
}

/// `GET /healthz/metrics`: reservation and drain counters since startup.
#[utoipa::path(
    get,
    path = "/healthz/metrics",
    tag = "Health",
    responses((status = 200, description = "Coordinator counters", body = MetricsResponse))
)]
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let snap = state.coordinator.metrics();
    (
        StatusCode::OK,
        Json(MetricsResponse {
            reservations_granted: snap.reservations_granted,
            releases: snap.releases,
            drains_started: snap.drains_started,
            drains_completed: snap.drains_completed,
            drains_failed: snap.drains_failed,
        }),
    )
}
