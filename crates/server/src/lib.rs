pub mod distributor;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mission Control API",
        version = "0.1.0",
        description = "Coordinator for multi-step missions executed by polling workers"
    ),
    paths(
        routes::health_check,
        routes::service_info,
        routes::list_missions,
        routes::create_mission,
        routes::get_mission,
        routes::get_next_step,
        routes::post_event,
        routes::get_steps,
        routes::list_events,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::ServiceInfo,
        error::ErrorResponse,
        mission_core::Mission,
        mission_core::MissionStatus,
        mission_core::CreateMissionRequest,
        mission_core::CreateMissionResponse,
        mission_core::NextStepResponse,
        mission_core::Plan,
        mission_core::Step,
        mission_core::Event,
        mission_core::EventPayload,
        mission_core::EventStatus,
        mission_core::NewEvent,
        mission_core::EventAck,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "missions", description = "Mission intake, step distribution and event log"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/", get(routes::service_info))
        .route("/health", get(routes::health_check))
        .route(
            "/missions",
            get(routes::list_missions).post(routes::create_mission),
        )
        .route("/missions/{id}", get(routes::get_mission))
        .route("/missions/{id}/next_step", get(routes::get_next_step))
        .route(
            "/missions/{id}/events",
            get(routes::list_events).post(routes::post_event),
        )
        .route("/missions/{id}/steps", get(routes::get_steps))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
