use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
