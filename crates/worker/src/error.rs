use coordinator_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Coordinator error: {0}")]
    Coordinator(#[from] ClientError),
}

pub type Result<T> = std::result::Result<T, WorkerError>;

/// Fault raised by an action handler. The executor records it against the
/// action and carries on with the rest of the step.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Missing required parameter: {0}")]
    MissingParam(&'static str),

    #[error("No repository path available to resolve {0}")]
    NoRepoPath(String),

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {seconds}s")]
    Timeout { program: String, seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid marker pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Cancelled")]
    Cancelled,
}
