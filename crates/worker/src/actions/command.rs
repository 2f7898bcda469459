use async_trait::async_trait;

use super::process::run_program;
use super::{required_str, timeout_param, ActionContext, ActionHandler, ActionParams, ActionResult};
use crate::error::ActionError;

/// Runs `cmd` through `sh -c` in `cwd` or the repository path.
pub struct RunCommandHandler;

#[async_trait]
impl ActionHandler for RunCommandHandler {
    async fn run(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let cmd = required_str(params, "cmd")?;
        let cwd = match params.param_str("cwd") {
            Some(dir) => Some(ctx.resolve_path(dir)?),
            None => ctx.repo_path.clone(),
        };
        let timeout = timeout_param(params, "timeout", ctx.settings.command_timeout);

        tracing::info!(cmd, cwd = ?cwd, "Running command");

        let output = match run_program("sh", &["-c", cmd], cwd.as_deref(), timeout).await {
            Ok(output) => output,
            Err(ActionError::Timeout { seconds, .. }) => {
                let message = format!("Command timed out after {}s", seconds);
                tracing::warn!(cmd, "{}", message);
                return Ok(ActionResult::failure(&message).with_stderr(message));
            }
            Err(e) => return Err(e),
        };

        let result = ActionResult {
            success: output.success,
            stdout: output.stdout,
            stderr: output.stderr,
            ..Default::default()
        };

        if result.success {
            Ok(result)
        } else {
            let code = output
                .code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            Ok(ActionResult {
                error: Some(format!("Command exited with code {}", code)),
                ..result
            })
        }
    }
}
