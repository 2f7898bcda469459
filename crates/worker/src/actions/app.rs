use std::time::Duration;

use async_trait::async_trait;

use super::process::{escape_applescript, run_applescript, run_program};
use super::{required_str, ActionContext, ActionHandler, ActionParams, ActionResult};
use super::{FallbackChain, Strategy};
use crate::error::ActionError;

const LAUNCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Launches an application by name: `open -a`, then AppleScript `activate`.
pub struct OpenAppHandler {
    chain: FallbackChain,
}

impl OpenAppHandler {
    pub fn new() -> Self {
        Self {
            chain: FallbackChain::new()
                .then(LaunchWithOpen)
                .then(ActivateWithAppleScript),
        }
    }
}

impl Default for OpenAppHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionHandler for OpenAppHandler {
    async fn run(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let app = required_str(params, "app")?;
        tracing::info!(app, "Opening application");

        let result = self.chain.run(params, ctx).await?;
        if result.success {
            Ok(result)
        } else {
            Ok(result.with_stdout(format!("Failed to open {}", app)))
        }
    }
}

struct LaunchWithOpen;

#[async_trait]
impl Strategy for LaunchWithOpen {
    fn name(&self) -> &str {
        "open -a"
    }

    async fn attempt(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let app = required_str(params, "app")?;
        let output = run_program("open", &["-a", app], None, LAUNCH_TIMEOUT).await?;

        if !output.success {
            return Ok(ActionResult::failure(format!(
                "open -a {} failed: {}",
                app,
                output.stderr.trim()
            )));
        }

        ctx.settle().await;
        Ok(ActionResult::ok(format!("Opened {}", app)))
    }
}

struct ActivateWithAppleScript;

#[async_trait]
impl Strategy for ActivateWithAppleScript {
    fn name(&self) -> &str {
        "applescript activate"
    }

    async fn attempt(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let app = required_str(params, "app")?;
        let script = format!(
            r#"tell application "{}" to activate"#,
            escape_applescript(app)
        );
        let output = run_applescript(&script, LAUNCH_TIMEOUT).await?;

        if !output.success {
            return Ok(ActionResult::failure(format!(
                "Could not activate {}: {}",
                app,
                output.stderr.trim()
            )));
        }

        ctx.settle().await;
        Ok(ActionResult::ok(format!("Activated {}", app)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActionSettings;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_missing_app_param() {
        let mut ctx = ActionContext::new(
            Arc::new(ActionSettings::immediate()),
            CancellationToken::new(),
        );

        let err = OpenAppHandler::new()
            .run(&ActionParams::new("open_app"), &mut ctx)
            .await
            .unwrap_err();

        assert!(matches!(err, ActionError::MissingParam("app")));
    }
}
