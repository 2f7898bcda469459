use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::plan::{Plan, Step};
use crate::error::CoreError;

pub const DEFAULT_WORKER_ID: &str = "worker-01";

/// Generates an opaque mission identifier of the form `m-1a2b3c4d`.
pub fn new_mission_id() -> String {
    format!("m-{}", short_uuid())
}

/// Generates an opaque event identifier of the form `e-1a2b3c4d`.
pub fn new_event_id() -> String {
    format!("e-{}", short_uuid())
}

fn short_uuid() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

/// Advisory lifecycle status. Never consulted when choosing the next step.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    #[default]
    Pending,
    Running,
    Done,
    Failed,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Mission {
    pub id: String,
    pub user: String,
    pub prompt: String,
    pub repo_path: String,
    pub worker_id: String,
    pub status: MissionStatus,
    pub plan: Plan,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Mission {
    pub fn new(
        id: impl Into<String>,
        user: impl Into<String>,
        prompt: impl Into<String>,
        repo_path: impl Into<String>,
        plan: Plan,
    ) -> Self {
        Self {
            id: id.into(),
            user: user.into(),
            prompt: prompt.into(),
            repo_path: repo_path.into(),
            worker_id: DEFAULT_WORKER_ID.to_string(),
            status: MissionStatus::default(),
            plan,
            created_at: Utc::now(),
        }
    }

    pub fn with_worker(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = worker_id.into();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateMissionRequest {
    pub user: String,
    pub prompt: String,
    pub repo_path: String,
    #[serde(default, alias = "mac_id")]
    pub worker_id: Option<String>,
}

impl CreateMissionRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        let required = [
            ("user", &self.user),
            ("prompt", &self.prompt),
            ("repo_path", &self.repo_path),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("{} cannot be empty", field)));
            }
        }
        Ok(())
    }

    pub fn worker_id(&self) -> &str {
        self.worker_id
            .as_deref()
            .filter(|w| !w.trim().is_empty())
            .unwrap_or(DEFAULT_WORKER_ID)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateMissionResponse {
    pub mission_id: String,
    pub plan: Plan,
}

/// Body of `GET /missions/{id}/next_step`; `step` is `null` once the plan is exhausted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NextStepResponse {
    pub step: Option<Step>,
}
