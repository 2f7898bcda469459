use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::ActionSettings;
use crate::error::ActionError;

pub const PROMPT_DEDUP_WINDOW: Duration = Duration::from_secs(2);

/// Remembers the last prompt sent so a repeat inside [`PROMPT_DEDUP_WINDOW`]
/// can be skipped.
#[derive(Debug, Default)]
pub struct PromptDedup {
    last_prompt: Option<String>,
    last_prompt_time: Option<Instant>,
}

impl PromptDedup {
    /// Returns `false` for a duplicate; otherwise records the prompt and returns `true`.
    pub fn admit(&mut self, prompt: &str) -> bool {
        let now = Instant::now();
        let duplicate = self.last_prompt.as_deref() == Some(prompt)
            && self
                .last_prompt_time
                .is_some_and(|t| now.duration_since(t) < PROMPT_DEDUP_WINDOW);

        if duplicate {
            return false;
        }

        self.last_prompt = Some(prompt.to_string());
        self.last_prompt_time = Some(now);
        true
    }
}

/// State the executor threads through every action of a step.
pub struct ActionContext {
    pub repo_path: Option<PathBuf>,
    pub cancel: CancellationToken,
    pub prompt_dedup: PromptDedup,
    pub settings: Arc<ActionSettings>,
}

impl ActionContext {
    pub fn new(settings: Arc<ActionSettings>, cancel: CancellationToken) -> Self {
        Self {
            repo_path: None,
            cancel,
            prompt_dedup: PromptDedup::default(),
            settings,
        }
    }

    pub fn repo_path(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }

    /// Resolves `path` against the repository path unless it is absolute.
    pub fn resolve_path(&self, path: &str) -> Result<PathBuf, ActionError> {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            return Ok(candidate.to_path_buf());
        }
        self.repo_path
            .as_ref()
            .map(|root| root.join(candidate))
            .ok_or_else(|| ActionError::NoRepoPath(path.to_string()))
    }

    /// Pauses for the configured settle delay; returns early on cancellation.
    pub async fn settle(&self) {
        crate::poll::sleep_or_cancel(self.settings.settle_delay, &self.cancel).await;
    }
}
