use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use ignore::WalkBuilder;
use regex::Regex;

use super::prompt::wait_for_completion;
use super::{required_str, timeout_param, ActionContext, ActionHandler, ActionParams, ActionResult};
use crate::error::ActionError;
use crate::poll::{poll_until, PollOutcome};

const FILE_POLL_INTERVAL: Duration = Duration::from_secs(1);
const MARKER_POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_SCANNED_FILE_BYTES: u64 = 1024 * 1024;

/// Waits until `file_path` exists.
pub struct WaitForFileHandler;

#[async_trait]
impl ActionHandler for WaitForFileHandler {
    async fn run(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let path = ctx.resolve_path(required_str(params, "file_path")?)?;
        let timeout = timeout_param(params, "timeout", Duration::from_secs(60));
        tracing::info!(path = %path.display(), timeout_secs = timeout.as_secs(), "Waiting for file");

        let outcome = poll_until(timeout, FILE_POLL_INTERVAL, &ctx.cancel, || {
            let path = path.clone();
            async move { tokio::fs::try_exists(&path).await.unwrap_or(false).then_some(()) }
        })
        .await;

        match outcome {
            PollOutcome::Ready(()) => Ok(ActionResult::ok(format!(
                "File found: {}",
                path.display()
            ))),
            PollOutcome::TimedOut => Ok(ActionResult::failure(format!(
                "Timed out after {}s waiting for file",
                timeout.as_secs()
            ))
            .with_stdout(format!("File not found: {}", path.display()))),
            PollOutcome::Cancelled => Err(ActionError::Cancelled),
        }
    }
}

/// Waits until `marker` appears in a file of the repository.
///
/// The walk honours `.gitignore` and skips hidden and oversized files.
pub struct WaitForMarkerHandler;

#[async_trait]
impl ActionHandler for WaitForMarkerHandler {
    async fn run(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let marker = required_str(params, "marker")?.to_string();
        let root = ctx
            .repo_path
            .clone()
            .ok_or_else(|| ActionError::NoRepoPath(marker.clone()))?;
        let pattern = Regex::new(&regex::escape(&marker))?;
        let timeout = timeout_param(params, "timeout", Duration::from_secs(30));
        tracing::info!(marker = %marker, root = %root.display(), "Waiting for marker");

        let outcome = poll_until(timeout, MARKER_POLL_INTERVAL, &ctx.cancel, || {
            let root = root.clone();
            let pattern = pattern.clone();
            async move {
                tokio::task::spawn_blocking(move || find_marker(&root, &pattern))
                    .await
                    .ok()
                    .flatten()
            }
        })
        .await;

        match outcome {
            PollOutcome::Ready(path) => Ok(ActionResult::ok(format!(
                "Marker {} found in {}",
                marker,
                path.display()
            ))
            .with_marker(marker)),
            PollOutcome::TimedOut => Ok(ActionResult::failure(format!(
                "Marker {} not found within {}s",
                marker,
                timeout.as_secs()
            ))),
            PollOutcome::Cancelled => Err(ActionError::Cancelled),
        }
    }
}

fn find_marker(root: &Path, pattern: &Regex) -> Option<PathBuf> {
    WalkBuilder::new(root)
        .build()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter(|entry| {
            entry
                .metadata()
                .map(|m| m.len() <= MAX_SCANNED_FILE_BYTES)
                .unwrap_or(false)
        })
        .find(|entry| {
            std::fs::read_to_string(entry.path())
                .map(|content| pattern.is_match(&content))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
}

/// Bounded wait for the AI to finish; always succeeds.
pub struct WaitForCompletionHandler;

#[async_trait]
impl ActionHandler for WaitForCompletionHandler {
    async fn run(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let expected = params.param_str_list("expected_files").unwrap_or_default();
        let timeout = timeout_param(params, "timeout", Duration::from_secs(30));

        let stdout = match wait_for_completion(ctx, &expected, timeout).await {
            Some(path) => format!("Completion detected: {}", path.display()),
            None => "Completion wait finished".to_string(),
        };
        Ok(ActionResult::ok(stdout))
    }
}
