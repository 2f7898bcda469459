use std::time::Duration;

use async_trait::async_trait;
use mission_core::Plan;
use reqwest::Client;
use tracing::{debug, error, info, warn};

use crate::error::{PlannerError, PlannerResult};
use crate::generator::{PlanRequest, Planner};
use crate::parse::parse_plan_response;
use crate::prompts::plan_prompt;
use crate::types::*;

const DEFAULT_MAX_RETRIES: u32 = 2;
const INITIAL_BACKOFF_MS: u64 = 500;
const MAX_BACKOFF_MS: u64 = 8000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_retries: u32,
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    async fn with_retry<T, F, Fut>(&self, operation: F, operation_name: &str) -> PlannerResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = PlannerResult<T>>,
    {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let err = match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => e,
            };

            let wait_ms = match &err {
                PlannerError::RateLimited { retry_after } => retry_after
                    .map(|s| s * 1000)
                    .unwrap_or(backoff_ms)
                    .min(MAX_BACKOFF_MS),
                PlannerError::Api {
                    status_code: Some(code),
                    ..
                } if *code >= 500 => backoff_ms,
                _ => return Err(err),
            };

            if retries >= self.max_retries {
                error!("{} failed after {} retries: {}", operation_name, retries, err);
                return Err(err);
            }

            warn!(
                "{} failed ({}), retrying in {}ms (attempt {}/{})",
                operation_name,
                err,
                wait_ms,
                retries + 1,
                self.max_retries
            );

            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
            retries += 1;
            backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
        }
    }

    pub async fn generate_content(&self, model: &str, prompt: &str) -> PlannerResult<String> {
        self.with_retry(
            || async { self.generate_content_inner(model, prompt).await },
            "generate_content",
        )
        .await
    }

    async fn generate_content_inner(&self, model: &str, prompt: &str) -> PlannerResult<String> {
        debug!("Requesting content from model {}", model);

        let request = GenerateContentRequest {
            contents: vec![Content::user(prompt)],
            generation_config: Some(GenerationConfig {
                temperature: 0.2,
                response_mime_type: "application/json".to_string(),
            }),
        };

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, model
            ))
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 429 {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok());
                warn!("Rate limited by planner API (retry after {:?}s)", retry_after);
                return Err(PlannerError::RateLimited { retry_after });
            }

            let error_text = response.text().await.unwrap_or_default();

            let message = serde_json::from_str::<ApiErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);

            return Err(PlannerError::Api {
                message,
                status_code: Some(status.as_u16()),
            });
        }

        let body: GenerateContentResponse = response.json().await?;
        body.text().ok_or(PlannerError::EmptyResponse)
    }
}

/// [`Planner`] backed by a Gemini model.
pub struct GeminiPlanner {
    client: GeminiClient,
    model: String,
}

impl GeminiPlanner {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Builds a planner from config, or `None` when no API key is configured.
    pub fn from_config(config: &PlannerConfig) -> Option<Self> {
        let api_key = config.api_key()?;
        let client = GeminiClient::new(api_key.to_string(), config.base_url.clone());
        Some(Self::new(client, config.model.clone()))
    }
}

#[async_trait]
impl Planner for GeminiPlanner {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn plan(&self, request: &PlanRequest) -> PlannerResult<Plan> {
        info!(
            mission_id = %request.mission_id,
            model = %self.model,
            "Generating plan"
        );

        let prompt = plan_prompt(&request.mission_id, &request.prompt, &request.repo_path);
        let text = self.client.generate_content(&self.model, &prompt).await?;
        parse_plan_response(&text, &request.mission_id)
    }
}
