use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use mission_core::{
    derive_status, new_event_id, new_mission_id, CreateMissionRequest, CreateMissionResponse,
    Event, EventAck, Mission, NewEvent, NextStepResponse, Plan,
};
use planner::PlanRequest;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::AppError;
use crate::state::AppState;

async fn load_mission(state: &AppState, id: &str) -> Result<Mission, AppError> {
    state
        .store
        .find_mission(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Mission not found: {}", id)))
}

#[utoipa::path(
    get,
    path = "/missions",
    responses(
        (status = 200, description = "All missions, newest first", body = Vec<Mission>)
    ),
    tag = "missions"
)]
pub async fn list_missions(State(state): State<AppState>) -> Result<Json<Vec<Mission>>, AppError> {
    let missions = state.store.list_missions().await?;
    Ok(Json(missions))
}

#[utoipa::path(
    post,
    path = "/missions",
    request_body = CreateMissionRequest,
    responses(
        (status = 201, description = "Mission created with its plan", body = CreateMissionResponse),
        (status = 422, description = "Invalid request", body = crate::error::ErrorResponse)
    ),
    tag = "missions"
)]
pub async fn create_mission(
    State(state): State<AppState>,
    payload: Result<Json<CreateMissionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateMissionResponse>), AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let mission_id = new_mission_id();
    let request = PlanRequest::new(&mission_id, &payload.prompt, &payload.repo_path);
    let plan = state.planner.generate(&request).await;

    let mission = Mission::new(
        &mission_id,
        &payload.user,
        &payload.prompt,
        &payload.repo_path,
        plan,
    )
    .with_worker(payload.worker_id());
    state.store.create_mission(&mission).await?;

    tracing::info!(
        mission_id = %mission.id,
        worker_id = %mission.worker_id,
        steps = mission.plan.len(),
        "Mission accepted"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateMissionResponse {
            mission_id: mission.id,
            plan: mission.plan,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/missions/{id}",
    params(("id" = String, Path, description = "Mission id")),
    responses(
        (status = 200, description = "Mission details", body = Mission),
        (status = 404, description = "Mission not found", body = crate::error::ErrorResponse)
    ),
    tag = "missions"
)]
pub async fn get_mission(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Mission>, AppError> {
    let mission = load_mission(&state, &id).await?;
    Ok(Json(mission))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NextStepQuery {
    /// Worker asking for work; only logged.
    #[serde(default, alias = "mac_id")]
    pub worker_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/missions/{id}/next_step",
    params(("id" = String, Path, description = "Mission id"), NextStepQuery),
    responses(
        (status = 200, description = "Next unreported step, or null when the plan is exhausted", body = NextStepResponse),
        (status = 404, description = "Mission not found", body = crate::error::ErrorResponse)
    ),
    tag = "missions"
)]
pub async fn get_next_step(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<NextStepQuery>, QueryRejection>,
) -> Result<Json<NextStepResponse>, AppError> {
    let Query(query) = query?;
    let step = state.distributor().next_step(&id).await?;

    tracing::info!(
        mission_id = %id,
        worker_id = query.worker_id.as_deref().unwrap_or("unknown"),
        step_id = step.as_ref().map(|s| s.step_id.as_str()).unwrap_or("none"),
        "Step requested"
    );

    Ok(Json(NextStepResponse { step }))
}

#[utoipa::path(
    post,
    path = "/missions/{id}/events",
    params(("id" = String, Path, description = "Mission id")),
    request_body = NewEvent,
    responses(
        (status = 200, description = "Event recorded", body = EventAck),
        (status = 404, description = "Mission not found", body = crate::error::ErrorResponse),
        (status = 422, description = "Invalid event", body = crate::error::ErrorResponse)
    ),
    tag = "missions"
)]
pub async fn post_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NewEvent>, JsonRejection>,
) -> Result<Json<EventAck>, AppError> {
    let Json(payload) = payload?;
    if payload.step_id.trim().is_empty() {
        return Err(AppError::Validation("step_id cannot be empty".to_string()));
    }
    if payload.worker_id.trim().is_empty() {
        return Err(AppError::Validation("worker_id cannot be empty".to_string()));
    }

    let mission = load_mission(&state, &id).await?;

    let (step_id, event_payload) = payload.into_payload();
    let event = Event::new(new_event_id(), &id, Some(step_id), event_payload);
    state.store.append_event(&event).await?;

    tracing::info!(
        mission_id = %id,
        event_id = %event.event_id,
        step_id = ?event.step_id,
        status = event.payload.status.as_str(),
        worker_id = %event.payload.worker_id,
        "Event recorded"
    );

    refresh_status(&state, &mission).await;

    Ok(Json(EventAck {
        ok: true,
        event_id: event.event_id,
    }))
}

/// Recomputes the advisory mission status. Failures are logged only: the
/// event is already committed and its acknowledgement must not change.
async fn refresh_status(state: &AppState, mission: &Mission) {
    let latest = match state.store.latest_step_statuses(&mission.id).await {
        Ok(latest) => latest,
        Err(e) => {
            tracing::warn!(mission_id = %mission.id, error = %e, "Could not read step statuses");
            return;
        }
    };

    let status = derive_status(&mission.plan, &latest);
    if status == mission.status {
        return;
    }

    match state.store.set_status(&mission.id, status).await {
        Ok(_) => {
            tracing::info!(mission_id = %mission.id, status = status.as_str(), "Mission status changed")
        }
        Err(e) => tracing::warn!(
            mission_id = %mission.id,
            status = status.as_str(),
            error = %e,
            "Could not update mission status"
        ),
    }
}

#[utoipa::path(
    get,
    path = "/missions/{id}/steps",
    params(("id" = String, Path, description = "Mission id")),
    responses(
        (status = 200, description = "Full plan as stored at creation", body = Plan),
        (status = 404, description = "Mission not found", body = crate::error::ErrorResponse)
    ),
    tag = "missions"
)]
pub async fn get_steps(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Plan>, AppError> {
    let mission = load_mission(&state, &id).await?;
    Ok(Json(mission.plan))
}

#[utoipa::path(
    get,
    path = "/missions/{id}/events",
    params(("id" = String, Path, description = "Mission id")),
    responses(
        (status = 200, description = "Event log in append order", body = Vec<Event>),
        (status = 404, description = "Mission not found", body = crate::error::ErrorResponse)
    ),
    tag = "missions"
)]
pub async fn list_events(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Event>>, AppError> {
    load_mission(&state, &id).await?;
    let events = state.store.events(&id).await?;
    Ok(Json(events))
}
