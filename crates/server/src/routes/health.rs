use axum::extract::State;
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the plan store cannot be read.
    status: String,
    version: String,
    /// `remote` when a planner is configured, `static` otherwise.
    planner: String,
    missions: Option<usize>,
}

/// Banner returned at the service root.
#[derive(Serialize, ToSchema)]
pub struct ServiceInfo {
    service: String,
    version: String,
    status: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Coordinator health", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let missions = match state.store.list_missions().await {
        Ok(missions) => Some(missions.len()),
        Err(e) => {
            tracing::warn!(error = %e, "Plan store unavailable during health check");
            None
        }
    };

    let planner = if state.planner.has_planner() {
        "remote"
    } else {
        "static"
    };

    Json(HealthResponse {
        status: if missions.is_some() { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        planner: planner.to_string(),
        missions,
    })
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service banner", body = ServiceInfo)
    ),
    tag = "health"
)]
pub async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        service: "mission-control".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
    })
}
