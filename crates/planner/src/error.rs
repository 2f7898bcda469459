use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Planner API error: {message}")]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Rate limited, retry after {retry_after:?}s")]
    RateLimited { retry_after: Option<u64> },

    #[error("Planner returned no text")]
    EmptyResponse,

    #[error("Planner output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Planner output failed validation: {0}")]
    InvalidPlan(String),
}

pub type PlannerResult<T> = std::result::Result<T, PlannerError>;
