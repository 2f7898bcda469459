use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Running,
    Completed,
    Failed,
    Stalled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Stalled => "stalled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "stalled" => Some(Self::Stalled),
            _ => None,
        }
    }
}

/// What a worker reports about one step execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventPayload {
    pub worker_id: String,
    pub status: EventStatus,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub screenshots: Vec<String>,
    #[serde(default)]
    pub found_markers: Vec<String>,
}

impl EventPayload {
    pub fn new(worker_id: impl Into<String>, status: EventStatus) -> Self {
        Self {
            worker_id: worker_id.into(),
            status,
            stdout: String::new(),
            stderr: String::new(),
            screenshots: Vec::new(),
            found_markers: Vec::new(),
        }
    }
}

/// Immutable entry of a mission's append-only event log.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Event {
    pub event_id: String,
    pub mission_id: String,
    pub step_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(
        event_id: impl Into<String>,
        mission_id: impl Into<String>,
        step_id: Option<String>,
        payload: EventPayload,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            mission_id: mission_id.into(),
            step_id,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Body of `POST /missions/{id}/events`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewEvent {
    #[serde(alias = "mac_id")]
    pub worker_id: String,
    pub step_id: String,
    pub status: EventStatus,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub screenshots: Option<Vec<String>>,
    #[serde(default)]
    pub found_markers: Option<Vec<String>>,
}

impl NewEvent {
    pub fn new(
        worker_id: impl Into<String>,
        step_id: impl Into<String>,
        status: EventStatus,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            step_id: step_id.into(),
            status,
            stdout: None,
            stderr: None,
            screenshots: None,
            found_markers: None,
        }
    }

    pub fn into_payload(self) -> (String, EventPayload) {
        let payload = EventPayload {
            worker_id: self.worker_id,
            status: self.status,
            stdout: self.stdout.unwrap_or_default(),
            stderr: self.stderr.unwrap_or_default(),
            screenshots: self.screenshots.unwrap_or_default(),
            found_markers: self.found_markers.unwrap_or_default(),
        };
        (self.step_id, payload)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventAck {
    pub ok: bool,
    pub event_id: String,
}
