use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use mission_core::{Action, Plan, Step};
use planner::{PlanGenerator, PlanRequest, Planner, PlannerError, PlannerResult};
use serde_json::{json, Value};
use server::{create_router, state::AppState};
use tempfile::TempDir;

struct UnavailablePlanner;

#[async_trait]
impl Planner for UnavailablePlanner {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn plan(&self, _request: &PlanRequest) -> PlannerResult<Plan> {
        Err(PlannerError::Api {
            message: "service unavailable".to_string(),
            status_code: Some(503),
        })
    }
}

struct ThreeStepPlanner;

#[async_trait]
impl Planner for ThreeStepPlanner {
    fn name(&self) -> &str {
        "three-step"
    }

    async fn plan(&self, request: &PlanRequest) -> PlannerResult<Plan> {
        Ok(Plan::new(
            &request.mission_id,
            vec![
                Step::new("s-1", "Prompt")
                    .with_action(
                        Action::new("prompt_ai")
                            .with_param("prompt", request.prompt.as_str())
                            .with_param("expected_files", json!(["src/App.tsx"])),
                    )
                    .with_expect_marker("C-2001"),
                Step::new("s-2", "Custom").with_action(
                    Action::new("launch_rocket").with_param("nested", json!({"a": [1, 2]})),
                ),
                Step::new("s-3", "Wait")
                    .with_action(Action::new("wait_for_file").with_param("file_path", "done.txt")),
            ],
        ))
    }
}

async fn setup_test_server(planner: PlanGenerator) -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite:{}", db_path.display());

    let pool = db::create_pool(&db_url).await.expect("Failed to create pool");
    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let state = AppState::from_pool(pool, planner);
    let server = TestServer::new(create_router(state)).expect("Failed to create test server");

    (server, temp_dir)
}

async fn static_server() -> (TestServer, TempDir) {
    setup_test_server(PlanGenerator::new(Arc::new(UnavailablePlanner))).await
}

async fn create_mission(server: &TestServer) -> String {
    let response = server
        .post("/missions")
        .json(&json!({
            "user": "alice",
            "prompt": "add a login button",
            "repo_path": "/work/app",
            "mac_id": "mac-01"
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: Value = response.json();
    body["mission_id"].as_str().unwrap().to_string()
}

async fn post_event(server: &TestServer, mission_id: &str, step_id: &str, status: &str) -> Value {
    let response = server
        .post(&format!("/missions/{}/events", mission_id))
        .json(&json!({
            "worker_id": "mac-01",
            "step_id": step_id,
            "status": status,
            "stdout": "ok"
        }))
        .await;

    response.assert_status_ok();
    response.json()
}

async fn next_step(server: &TestServer, mission_id: &str) -> Value {
    let response = server
        .get(&format!("/missions/{}/next_step", mission_id))
        .add_query_param("worker_id", "mac-01")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    body["step"].clone()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoint() {
        let (server, _temp_dir) = static_server().await;

        let response = server.get("/health").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["planner"], "remote");
        assert_eq!(body["missions"], 0);
    }

    #[tokio::test]
    async fn test_health_counts_missions() {
        let (server, _temp_dir) = setup_test_server(PlanGenerator::static_only()).await;
        create_mission(&server).await;

        let body: Value = server.get("/health").await.json();
        assert_eq!(body["planner"], "static");
        assert_eq!(body["missions"], 1);
    }

    #[tokio::test]
    async fn test_service_banner() {
        let (server, _temp_dir) = static_server().await;

        let body: Value = server.get("/").await.json();
        assert_eq!(body["service"], "mission-control");
        assert_eq!(body["status"], "running");
    }

    #[tokio::test]
    async fn test_openapi_document() {
        let (server, _temp_dir) = static_server().await;

        let response = server.get("/api/openapi.json").await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["paths"]["/missions/{id}/next_step"].is_object());
    }
}

mod missions {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_planner_yields_static_plan() {
        let (server, _temp_dir) = static_server().await;

        let response = server
            .post("/missions")
            .json(&json!({
                "user": "alice",
                "prompt": "add a login button",
                "repo_path": "/work/app"
            }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        let mission_id = body["mission_id"].as_str().unwrap();
        assert!(mission_id.starts_with("m-"));
        assert_eq!(mission_id.len(), 10);

        let steps = body["plan"]["plan"].as_array().unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0]["step_id"], "s-1");
        assert_eq!(steps[0]["expect_marker"], "C-1001");
        assert_eq!(steps[1]["step_id"], "s-2");
        assert_eq!(steps[1]["expect_marker"], "C-1002");
        assert_eq!(body["plan"]["mission_id"], mission_id);
    }

    #[tokio::test]
    async fn test_get_mission() {
        let (server, _temp_dir) = static_server().await;
        let mission_id = create_mission(&server).await;

        let response = server.get(&format!("/missions/{}", mission_id)).await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["id"], mission_id.as_str());
        assert_eq!(body["user"], "alice");
        assert_eq!(body["repo_path"], "/work/app");
        assert_eq!(body["worker_id"], "mac-01");
        assert_eq!(body["status"], "pending");
        assert_eq!(body["plan"]["plan"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_default_worker_id() {
        let (server, _temp_dir) = static_server().await;

        let body: Value = server
            .post("/missions")
            .json(&json!({"user": "bob", "prompt": "p", "repo_path": "/r"}))
            .await
            .json();
        let mission_id = body["mission_id"].as_str().unwrap();

        let mission: Value = server.get(&format!("/missions/{}", mission_id)).await.json();
        assert_eq!(mission["worker_id"], "worker-01");
    }

    #[tokio::test]
    async fn test_list_missions() {
        let (server, _temp_dir) = static_server().await;
        create_mission(&server).await;
        create_mission(&server).await;

        let body: Value = server.get("/missions").await.json();
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_unknown_mission_returns_404() {
        let (server, _temp_dir) = static_server().await;

        let response = server.get("/missions/m-missing").await;

        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn test_create_mission_with_empty_field_returns_422() {
        let (server, _temp_dir) = static_server().await;

        let response = server
            .post("/missions")
            .json(&json!({"user": "alice", "prompt": "  ", "repo_path": "/work/app"}))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json();
        assert_eq!(body["error"], "validation_error");

        let list: Value = server.get("/missions").await.json();
        assert!(list.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_mission_with_missing_field_returns_422() {
        let (server, _temp_dir) = static_server().await;

        let response = server
            .post("/missions")
            .json(&json!({"user": "alice"}))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_plan_round_trips_unchanged() {
        let (server, _temp_dir) =
            setup_test_server(PlanGenerator::new(Arc::new(ThreeStepPlanner))).await;

        let created: Value = server
            .post("/missions")
            .json(&json!({"user": "alice", "prompt": "build it", "repo_path": "/r"}))
            .await
            .json();
        let mission_id = created["mission_id"].as_str().unwrap();

        let response = server.get(&format!("/missions/{}/steps", mission_id)).await;

        response.assert_status_ok();
        let steps: Value = response.json();
        assert_eq!(steps, created["plan"]);
        assert_eq!(steps["plan"][1]["actions"][0]["type"], "launch_rocket");
        assert_eq!(steps["plan"][1]["actions"][0]["nested"]["a"][1], 2);
        assert_eq!(
            steps["plan"][0]["actions"][0]["expected_files"][0],
            "src/App.tsx"
        );
    }

    #[tokio::test]
    async fn test_steps_of_unknown_mission_returns_404() {
        let (server, _temp_dir) = static_server().await;

        server
            .get("/missions/m-missing/steps")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}

mod distribution {
    use super::*;

    #[tokio::test]
    async fn test_failed_step_is_not_reoffered() {
        let (server, _temp_dir) = static_server().await;
        let mission_id = create_mission(&server).await;

        assert_eq!(next_step(&server, &mission_id).await["step_id"], "s-1");

        post_event(&server, &mission_id, "s-1", "completed").await;
        assert_eq!(next_step(&server, &mission_id).await["step_id"], "s-2");

        post_event(&server, &mission_id, "s-2", "failed").await;
        assert!(next_step(&server, &mission_id).await.is_null());
    }

    #[tokio::test]
    async fn test_next_step_is_idempotent() {
        let (server, _temp_dir) = static_server().await;
        let mission_id = create_mission(&server).await;

        let first = next_step(&server, &mission_id).await;
        let second = next_step(&server, &mission_id).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_next_step_for_unknown_mission_returns_404() {
        let (server, _temp_dir) = static_server().await;

        server
            .get("/missions/m-missing/next_step")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_status_follows_events() {
        let (server, _temp_dir) = static_server().await;
        let mission_id = create_mission(&server).await;

        post_event(&server, &mission_id, "s-1", "completed").await;
        let mission: Value = server.get(&format!("/missions/{}", mission_id)).await.json();
        assert_eq!(mission["status"], "running");

        post_event(&server, &mission_id, "s-2", "failed").await;
        let mission: Value = server.get(&format!("/missions/{}", mission_id)).await.json();
        assert_eq!(mission["status"], "failed");
    }
}

mod events {
    use super::*;
    use db::{DbError, PlanStore, SqlitePlanStore};
    use mission_core::{Event, EventStatus, Mission, MissionStatus};
    use std::collections::{HashMap, HashSet};

    /// Plan store whose advisory status writes always fail.
    struct StatusWriteFails(SqlitePlanStore);

    #[async_trait]
    impl PlanStore for StatusWriteFails {
        async fn create_mission(&self, mission: &Mission) -> Result<(), DbError> {
            self.0.create_mission(mission).await
        }

        async fn find_mission(&self, id: &str) -> Result<Option<Mission>, DbError> {
            self.0.find_mission(id).await
        }

        async fn list_missions(&self) -> Result<Vec<Mission>, DbError> {
            self.0.list_missions().await
        }

        async fn set_status(&self, _id: &str, _status: MissionStatus) -> Result<bool, DbError> {
            Err(DbError::Sqlx(sqlx::Error::PoolClosed))
        }

        async fn append_event(&self, event: &Event) -> Result<(), DbError> {
            self.0.append_event(event).await
        }

        async fn events(&self, mission_id: &str) -> Result<Vec<Event>, DbError> {
            self.0.events(mission_id).await
        }

        async fn reported_step_ids(&self, mission_id: &str) -> Result<HashSet<String>, DbError> {
            self.0.reported_step_ids(mission_id).await
        }

        async fn latest_step_statuses(
            &self,
            mission_id: &str,
        ) -> Result<HashMap<String, EventStatus>, DbError> {
            self.0.latest_step_statuses(mission_id).await
        }
    }

    #[tokio::test]
    async fn test_event_acknowledged_when_status_update_fails() {
        let temp_dir = TempDir::new().unwrap();
        let pool = db::create_pool(&format!("sqlite:{}", temp_dir.path().join("t.db").display()))
            .await
            .unwrap();
        db::run_migrations(&pool).await.unwrap();
        let store = Arc::new(StatusWriteFails(SqlitePlanStore::new(pool)));
        let state = AppState::new(store, PlanGenerator::static_only());
        let server = TestServer::new(create_router(state)).unwrap();
        let mission_id = create_mission(&server).await;

        let ack = post_event(&server, &mission_id, "s-1", "completed").await;

        assert_eq!(ack["ok"], true);
        let events: Value = server
            .get(&format!("/missions/{}/events", mission_id))
            .await
            .json();
        assert_eq!(events.as_array().unwrap().len(), 1);
        assert_eq!(next_step(&server, &mission_id).await["step_id"], "s-2");
    }

    #[tokio::test]
    async fn test_post_event_returns_ack() {
        let (server, _temp_dir) = static_server().await;
        let mission_id = create_mission(&server).await;

        let ack = post_event(&server, &mission_id, "s-1", "running").await;

        assert_eq!(ack["ok"], true);
        assert!(ack["event_id"].as_str().unwrap().starts_with("e-"));
    }

    #[tokio::test]
    async fn test_event_log_in_append_order() {
        let (server, _temp_dir) = static_server().await;
        let mission_id = create_mission(&server).await;

        post_event(&server, &mission_id, "s-1", "running").await;
        post_event(&server, &mission_id, "s-1", "completed").await;

        let events: Value = server
            .get(&format!("/missions/{}/events", mission_id))
            .await
            .json();
        let events = events.as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["payload"]["status"], "running");
        assert_eq!(events[1]["payload"]["status"], "completed");
        assert_eq!(events[1]["payload"]["worker_id"], "mac-01");
        assert_eq!(events[1]["payload"]["stdout"], "ok");
    }

    #[tokio::test]
    async fn test_event_for_unknown_mission_writes_nothing() {
        let (server, _temp_dir) = static_server().await;

        let response = server
            .post("/missions/m-unknown/events")
            .json(&json!({
                "worker_id": "mac-01",
                "step_id": "s-1",
                "status": "completed"
            }))
            .await;

        response.assert_status(StatusCode::NOT_FOUND);

        let missions: Value = server.get("/missions").await.json();
        assert!(missions.as_array().unwrap().is_empty());
        server
            .get("/missions/m-unknown/events")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_event_status_returns_422_and_writes_nothing() {
        let (server, _temp_dir) = static_server().await;
        let mission_id = create_mission(&server).await;

        let response = server
            .post(&format!("/missions/{}/events", mission_id))
            .json(&json!({
                "worker_id": "mac-01",
                "step_id": "s-1",
                "status": "exploded"
            }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

        let events: Value = server
            .get(&format!("/missions/{}/events", mission_id))
            .await
            .json();
        assert!(events.as_array().unwrap().is_empty());
        assert_eq!(next_step(&server, &mission_id).await["step_id"], "s-1");
    }

    #[tokio::test]
    async fn test_empty_step_id_returns_422() {
        let (server, _temp_dir) = static_server().await;
        let mission_id = create_mission(&server).await;

        server
            .post(&format!("/missions/{}/events", mission_id))
            .json(&json!({"worker_id": "mac-01", "step_id": "", "status": "completed"}))
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }
}
