use std::path::Path;
use std::sync::Arc;

use mission_core::Step;
use tokio_util::sync::CancellationToken;

use crate::actions::{ActionContext, ActionKind, HandlerRegistry};
use crate::config::ActionSettings;

/// Aggregated outcome of every action in a step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResult {
    pub step_id: String,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub screenshots: Vec<String>,
    pub errors: Vec<String>,
    pub found_markers: Vec<String>,
}

/// Runs a step's actions in order through the handler registry.
///
/// Every action runs even after an earlier one fails.
pub struct StepExecutor {
    registry: HandlerRegistry,
    context: ActionContext,
}

impl StepExecutor {
    pub fn new(
        registry: HandlerRegistry,
        settings: Arc<ActionSettings>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            registry,
            context: ActionContext::new(settings, cancel),
        }
    }

    pub fn with_defaults(settings: Arc<ActionSettings>, cancel: CancellationToken) -> Self {
        Self::new(HandlerRegistry::with_defaults(), settings, cancel)
    }

    pub fn registry_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.registry
    }

    pub async fn execute(&mut self, step: &Step, repo_path: Option<&Path>) -> ExecutionResult {
        self.context.repo_path = repo_path.map(Path::to_path_buf);

        let mut result = ExecutionResult {
            step_id: step.step_id.clone(),
            success: true,
            ..Default::default()
        };
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        tracing::info!(
            step_id = %step.step_id,
            title = %step.title,
            actions = step.actions.len(),
            "Executing step"
        );

        for (index, action) in step.actions.iter().enumerate() {
            let handler = ActionKind::parse(&action.kind).and_then(|kind| self.registry.get(kind));
            let Some(handler) = handler else {
                result.success = false;
                result.errors.push(format!(
                    "Action {} failed: Unknown action type: {}",
                    action.kind, action.kind
                ));
                tracing::warn!(step_id = %step.step_id, action = %action.kind, "Unknown action type");
                continue;
            };

            tracing::debug!(step_id = %step.step_id, index, action = %action.kind, "Running action");

            match handler.run(action, &mut self.context).await {
                Ok(outcome) => {
                    if !outcome.stdout.is_empty() {
                        stdout.push(outcome.stdout);
                    }
                    if !outcome.stderr.is_empty() {
                        stderr.push(outcome.stderr);
                    }
                    if let Some(shot) = outcome.screenshot {
                        result.screenshots.push(shot);
                    }
                    for marker in outcome.markers {
                        if !result.found_markers.contains(&marker) {
                            result.found_markers.push(marker);
                        }
                    }
                    if !outcome.success {
                        result.success = false;
                        let error = outcome.error.unwrap_or_else(|| "unknown error".to_string());
                        tracing::warn!(step_id = %step.step_id, action = %action.kind, error = %error, "Action failed");
                        result
                            .errors
                            .push(format!("Action {} failed: {}", action.kind, error));
                    }
                }
                Err(e) => {
                    result.success = false;
                    tracing::error!(step_id = %step.step_id, action = %action.kind, error = %e, "Action raised an error");
                    result
                        .errors
                        .push(format!("Exception in action {}: {}", action.kind, e));
                }
            }
        }

        result.stdout = stdout.join("\n");
        result.stderr = stderr.join("\n");

        tracing::info!(
            step_id = %step.step_id,
            success = result.success,
            errors = result.errors.len(),
            "Step finished"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{ActionHandler, ActionParams, ActionResult};
    use crate::error::ActionError;
    use async_trait::async_trait;
    use mission_core::Action;

    struct Echo;

    #[async_trait]
    impl ActionHandler for Echo {
        async fn run(
            &self,
            params: &ActionParams,
            _ctx: &mut ActionContext,
        ) -> Result<ActionResult, ActionError> {
            Ok(ActionResult::ok(params.param_str("text").unwrap_or_default()))
        }
    }

    struct Refuse;

    #[async_trait]
    impl ActionHandler for Refuse {
        async fn run(
            &self,
            _params: &ActionParams,
            _ctx: &mut ActionContext,
        ) -> Result<ActionResult, ActionError> {
            Ok(ActionResult::failure("app not installed")
                .with_stdout("refused")
                .with_stderr("no such app"))
        }
    }

    struct Explode;

    #[async_trait]
    impl ActionHandler for Explode {
        async fn run(
            &self,
            _params: &ActionParams,
            _ctx: &mut ActionContext,
        ) -> Result<ActionResult, ActionError> {
            Err(ActionError::MissingParam("path"))
        }
    }

    struct Capture;

    #[async_trait]
    impl ActionHandler for Capture {
        async fn run(
            &self,
            _params: &ActionParams,
            ctx: &mut ActionContext,
        ) -> Result<ActionResult, ActionError> {
            let repo = ctx
                .repo_path()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            Ok(ActionResult::ok(repo)
                .with_screenshot("data:image/png;base64,AAAA".to_string())
                .with_marker("C-1001"))
        }
    }

    fn executor() -> StepExecutor {
        let mut registry = HandlerRegistry::new();
        registry.register(ActionKind::RunCommand, Arc::new(Echo));
        registry.register(ActionKind::OpenApp, Arc::new(Refuse));
        registry.register(ActionKind::OpenProject, Arc::new(Explode));
        registry.register(ActionKind::Screenshot, Arc::new(Capture));
        StepExecutor::new(
            registry,
            Arc::new(ActionSettings::immediate()),
            CancellationToken::new(),
        )
    }

    fn echo(text: &str) -> Action {
        Action::new("run_command").with_param("text", text)
    }

    #[tokio::test]
    async fn test_all_actions_succeed() {
        let step = Step::new("s-1", "Echo")
            .with_action(echo("one"))
            .with_action(echo("two"));

        let result = executor().execute(&step, None).await;

        assert!(result.success);
        assert_eq!(result.step_id, "s-1");
        assert_eq!(result.stdout, "one\ntwo");
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_stop_the_step() {
        let step = Step::new("s-1", "Mixed")
            .with_action(echo("before"))
            .with_action(Action::new("open_app"))
            .with_action(echo("after"));

        let result = executor().execute(&step, None).await;

        assert!(!result.success);
        assert_eq!(
            result.errors,
            vec!["Action open_app failed: app not installed".to_string()]
        );
        assert_eq!(result.stdout, "before\nrefused\nafter");
        assert_eq!(result.stderr, "no such app");
    }

    #[tokio::test]
    async fn test_unknown_action_type() {
        let step = Step::new("s-1", "Unknown")
            .with_action(Action::new("launch_rocket"))
            .with_action(echo("still runs"));

        let result = executor().execute(&step, None).await;

        assert!(!result.success);
        assert_eq!(
            result.errors,
            vec!["Action launch_rocket failed: Unknown action type: launch_rocket".to_string()]
        );
        assert_eq!(result.stdout, "still runs");
    }

    #[tokio::test]
    async fn test_handler_error_is_recorded_as_exception() {
        let step = Step::new("s-1", "Boom")
            .with_action(Action::new("open_project"))
            .with_action(echo("after"));

        let result = executor().execute(&step, None).await;

        assert!(!result.success);
        assert_eq!(
            result.errors,
            vec!["Exception in action open_project: Missing required parameter: path".to_string()]
        );
        assert_eq!(result.stdout, "after");
    }

    #[tokio::test]
    async fn test_screenshots_and_markers_collected() {
        let step = Step::new("s-1", "Capture")
            .with_action(Action::new("screenshot"))
            .with_action(Action::new("screenshot"));

        let result = executor()
            .execute(&step, Some(Path::new("/work/app")))
            .await;

        assert!(result.success);
        assert_eq!(result.screenshots.len(), 2);
        assert_eq!(result.found_markers, vec!["C-1001".to_string()]);
        assert_eq!(result.stdout, "/work/app\n/work/app");
    }

    #[tokio::test]
    async fn test_legacy_alias_dispatches() {
        let mut executor = executor();
        executor
            .registry_mut()
            .register(ActionKind::PromptAi, Arc::new(Echo));
        let step = Step::new("s-1", "Prompt")
            .with_action(Action::new("prompt_kiro_ai").with_param("text", "sent"));

        let result = executor.execute(&step, None).await;

        assert!(result.success);
        assert_eq!(result.stdout, "sent");
    }

    #[tokio::test]
    async fn test_oversized_timeout_ends_with_a_result() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("done.txt"), "").unwrap();
        let step = Step::new("s-3", "Wait").with_action(
            Action::new("wait_for_file")
                .with_param("file_path", "done.txt")
                .with_param("timeout", u64::MAX),
        );

        let repo = dir.path().to_path_buf();
        let result = tokio::spawn(async move {
            StepExecutor::with_defaults(
                Arc::new(ActionSettings::immediate()),
                CancellationToken::new(),
            )
            .execute(&step, Some(&repo))
            .await
        })
        .await
        .unwrap();

        assert!(result.success);
        assert!(result.stdout.starts_with("File found"));
    }

    #[tokio::test]
    async fn test_default_registry_runs_commands() {
        let dir = tempfile::tempdir().unwrap();
        let mut executor = StepExecutor::with_defaults(
            Arc::new(ActionSettings::immediate()),
            CancellationToken::new(),
        );
        let step = Step::new("s-2", "Run tests")
            .with_action(Action::new("run_command").with_param("cmd", "echo hello"));

        let result = executor.execute(&step, Some(dir.path())).await;

        assert!(result.success);
        assert_eq!(result.stdout.trim(), "hello");
    }
}
