//! Action dispatch: the closed set of action kinds, the handler contract and
//! the built-in handlers.

mod app;
mod command;
mod context;
mod process;
mod project;
mod prompt;
mod registry;
mod screenshot;
mod strategy;
mod wait;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ActionError;

pub use app::OpenAppHandler;
pub use command::RunCommandHandler;
pub use context::{ActionContext, PromptDedup, PROMPT_DEDUP_WINDOW};
pub use process::{escape_applescript, run_program, CommandOutput};
pub use project::OpenProjectHandler;
pub use prompt::{wait_for_completion, PromptAiHandler, PROJECT_MARKER_FILES};
pub use registry::HandlerRegistry;
pub use screenshot::{ScreenshotHandler, SCREENSHOT_DATA_URI_PREFIX};
pub use strategy::{FallbackChain, Strategy};
pub use wait::{WaitForCompletionHandler, WaitForFileHandler, WaitForMarkerHandler};

/// Parameters of a single action as stored in the plan.
pub type ActionParams = mission_core::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    OpenApp,
    RunCommand,
    Screenshot,
    OpenProject,
    PromptAi,
    WaitForMarker,
    WaitForFile,
    WaitForCompletion,
}

impl ActionKind {
    pub const ALL: [ActionKind; 8] = [
        ActionKind::OpenApp,
        ActionKind::RunCommand,
        ActionKind::Screenshot,
        ActionKind::OpenProject,
        ActionKind::PromptAi,
        ActionKind::WaitForMarker,
        ActionKind::WaitForFile,
        ActionKind::WaitForCompletion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::OpenApp => "open_app",
            ActionKind::RunCommand => "run_command",
            ActionKind::Screenshot => "screenshot",
            ActionKind::OpenProject => "open_project",
            ActionKind::PromptAi => "prompt_ai",
            ActionKind::WaitForMarker => "wait_for_marker",
            ActionKind::WaitForFile => "wait_for_file",
            ActionKind::WaitForCompletion => "wait_for_completion",
        }
    }

    /// Resolves a plan's `type` string, accepting the legacy IDE-specific names.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open_app" => Some(ActionKind::OpenApp),
            "run_command" => Some(ActionKind::RunCommand),
            "screenshot" => Some(ActionKind::Screenshot),
            "open_project" => Some(ActionKind::OpenProject),
            "prompt_ai" | "prompt_kiro_ai" => Some(ActionKind::PromptAi),
            "wait_for_marker" => Some(ActionKind::WaitForMarker),
            "wait_for_file" => Some(ActionKind::WaitForFile),
            "wait_for_completion" | "wait_for_kiro_completion" => {
                Some(ActionKind::WaitForCompletion)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one action. A failed action is a normal result, not an error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// Data URI of a captured image.
    pub screenshot: Option<String>,
    pub error: Option<String>,
    pub markers: Vec<String>,
}

impl ActionResult {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    pub fn with_screenshot(mut self, data_uri: String) -> Self {
        self.screenshot = Some(data_uri);
        self
    }

    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.push(marker.into());
        self
    }

    pub fn append_stdout(&mut self, line: &str) {
        if !self.stdout.is_empty() {
            self.stdout.push('\n');
        }
        self.stdout.push_str(line);
    }
}

#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn run(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError>;
}

/// Upper bound for any timeout taken from a plan.
pub const MAX_ACTION_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Reads `key` as whole seconds, clamped to [`MAX_ACTION_TIMEOUT`].
pub(crate) fn timeout_param(params: &ActionParams, key: &str, default: Duration) -> Duration {
    params
        .param_u64(key)
        .map(Duration::from_secs)
        .unwrap_or(default)
        .min(MAX_ACTION_TIMEOUT)
}

pub(crate) fn required_str<'a>(
    params: &'a ActionParams,
    key: &'static str,
) -> Result<&'a str, ActionError> {
    params
        .param_str(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ActionError::MissingParam(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for kind in ActionKind::ALL {
            assert_eq!(ActionKind::parse(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_parse_legacy_aliases() {
        assert_eq!(
            ActionKind::parse("prompt_kiro_ai"),
            Some(ActionKind::PromptAi)
        );
        assert_eq!(
            ActionKind::parse("wait_for_kiro_completion"),
            Some(ActionKind::WaitForCompletion)
        );
        assert_eq!(ActionKind::parse("launch_rocket"), None);
    }

    #[test]
    fn test_timeout_param_is_clamped() {
        let default = Duration::from_secs(30);
        let huge = ActionParams::new("wait_for_file").with_param("timeout", u64::MAX);
        let small = ActionParams::new("wait_for_file").with_param("timeout", 5);

        assert_eq!(timeout_param(&huge, "timeout", default), MAX_ACTION_TIMEOUT);
        assert_eq!(timeout_param(&small, "timeout", default), Duration::from_secs(5));
        assert_eq!(
            timeout_param(&ActionParams::new("screenshot"), "timeout", default),
            default
        );
    }

    #[test]
    fn test_required_str() {
        let params = ActionParams::new("run_command")
            .with_param("cmd", "ls")
            .with_param("cwd", " ");

        assert_eq!(required_str(&params, "cmd").unwrap(), "ls");
        assert!(matches!(
            required_str(&params, "cwd"),
            Err(ActionError::MissingParam("cwd"))
        ));
    }

    #[test]
    fn test_append_stdout() {
        let mut result = ActionResult::ok("");
        result.append_stdout("first");
        result.append_stdout("second");
        assert_eq!(result.stdout, "first\nsecond");
    }
}
