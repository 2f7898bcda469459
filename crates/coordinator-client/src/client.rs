use std::time::Duration;

use mission_core::{
    CreateMissionRequest, CreateMissionResponse, EventAck, Mission, NewEvent, NextStepResponse,
    Plan, Step,
};
use reqwest::{Client, StatusCode};

use crate::error::{ClientError, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the coordinator's mission API.
#[derive(Clone)]
pub struct CoordinatorClient {
    base_url: String,
    client: Client,
}

impl CoordinatorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::with_client(base_url, client)
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn create_mission(
        &self,
        request: &CreateMissionRequest,
    ) -> Result<CreateMissionResponse> {
        let response = self
            .client
            .post(format!("{}/missions", self.base_url))
            .json(request)
            .send()
            .await?;

        self.handle_response(response, "new mission").await
    }

    pub async fn get_mission(&self, mission_id: &str) -> Result<Mission> {
        let response = self
            .client
            .get(format!("{}/missions/{}", self.base_url, mission_id))
            .send()
            .await?;

        self.handle_response(response, mission_id).await
    }

    pub async fn next_step(&self, mission_id: &str, worker_id: &str) -> Result<Option<Step>> {
        let response = self
            .client
            .get(format!("{}/missions/{}/next_step", self.base_url, mission_id))
            .query(&[("worker_id", worker_id)])
            .send()
            .await?;

        let body: NextStepResponse = self.handle_response(response, mission_id).await?;
        Ok(body.step)
    }

    pub async fn post_event(&self, mission_id: &str, event: &NewEvent) -> Result<EventAck> {
        let response = self
            .client
            .post(format!("{}/missions/{}/events", self.base_url, mission_id))
            .json(event)
            .send()
            .await?;

        self.handle_response(response, mission_id).await
    }

    pub async fn get_steps(&self, mission_id: &str) -> Result<Plan> {
        let response = self
            .client
            .get(format!("{}/missions/{}/steps", self.base_url, mission_id))
            .send()
            .await?;

        self.handle_response(response, mission_id).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        mission_id: &str,
    ) -> Result<T> {
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::MissionNotFound(mission_id.to_string()));
        }

        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Rejected(body));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = %status, body = %body, "Coordinator returned error status");
            return Err(ClientError::InvalidResponse(format!(
                "Status {}: {}",
                status, body
            )));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
