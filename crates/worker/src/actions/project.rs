use std::time::Duration;

use async_trait::async_trait;

use super::process::{escape_applescript, run_applescript};
use super::{ActionContext, ActionHandler, ActionParams, ActionResult};
use super::{FallbackChain, Strategy};
use crate::error::ActionError;

const SCRIPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens a project directory in the IDE.
pub struct OpenProjectHandler {
    chain: FallbackChain,
}

impl OpenProjectHandler {
    pub fn new() -> Self {
        Self {
            chain: FallbackChain::new()
                .then(DirectOpen)
                .then(OpenDialogShortcut),
        }
    }
}

impl Default for OpenProjectHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionHandler for OpenProjectHandler {
    async fn run(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let (path, app) = target(params, ctx)?;
        tracing::info!(path = %path, app = %app, "Opening project");

        let result = self.chain.run(params, ctx).await?;
        if result.success {
            Ok(result)
        } else {
            Ok(result.with_stdout(format!("Failed to open project: {}", path)))
        }
    }
}

/// Project path (`path` or the repository path) and hosting app.
fn target(params: &ActionParams, ctx: &ActionContext) -> Result<(String, String), ActionError> {
    let path = match params.param_str("path").filter(|p| !p.trim().is_empty()) {
        Some(p) => ctx.resolve_path(p)?,
        None => ctx
            .repo_path
            .clone()
            .ok_or(ActionError::MissingParam("path"))?,
    };
    let app = params
        .param_str("app")
        .unwrap_or(&ctx.settings.ide_app)
        .to_string();

    Ok((path.to_string_lossy().into_owned(), app))
}

struct DirectOpen;

#[async_trait]
impl Strategy for DirectOpen {
    fn name(&self) -> &str {
        "applescript open"
    }

    async fn attempt(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let (path, app) = target(params, ctx)?;
        let script = format!(
            r#"tell application "{app}"
    activate
    delay 0.3
    open POSIX file "{path}"
end tell"#,
            app = escape_applescript(&app),
            path = escape_applescript(&path),
        );

        let output = run_applescript(&script, SCRIPT_TIMEOUT).await?;
        if !output.success {
            let reason = if output.stderr.trim().is_empty() {
                output.stdout
            } else {
                output.stderr
            };
            return Ok(ActionResult::failure(format!(
                "Direct open failed: {}",
                reason.trim()
            )));
        }

        ctx.settle().await;
        Ok(ActionResult::ok(format!("Opened project: {}", path)))
    }
}

/// Cmd+O, type the path into the dialog, press Return.
struct OpenDialogShortcut;

#[async_trait]
impl Strategy for OpenDialogShortcut {
    fn name(&self) -> &str {
        "open dialog shortcut"
    }

    async fn attempt(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let (path, app) = target(params, ctx)?;
        let app = escape_applescript(&app);
        let script = format!(
            r#"tell application "{app}" to activate
delay 0.5
tell application "System Events"
    tell process "{app}"
        keystroke "o" using command down
        delay 0.5
        keystroke "{path}"
        delay 0.3
        key code 36
    end tell
end tell"#,
            app = app,
            path = escape_applescript(&path),
        );

        let output = run_applescript(&script, SCRIPT_TIMEOUT).await?;
        if !output.success {
            return Ok(ActionResult::failure(format!(
                "Open dialog failed: {}",
                output.stderr.trim()
            )));
        }

        ctx.settle().await;
        Ok(ActionResult::ok(format!("Opened project via dialog: {}", path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ActionSettings;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn ctx() -> ActionContext {
        ActionContext::new(
            Arc::new(ActionSettings::immediate()),
            CancellationToken::new(),
        )
    }

    #[test]
    fn test_target_defaults_to_repo_path_and_ide() {
        let mut ctx = ctx();
        ctx.repo_path = Some(PathBuf::from("/work/app"));

        let (path, app) = target(&ActionParams::new("open_project"), &ctx).unwrap();
        assert_eq!(path, "/work/app");
        assert_eq!(app, "Kiro");
    }

    #[test]
    fn test_target_explicit_params() {
        let params = ActionParams::new("open_project")
            .with_param("path", "/other")
            .with_param("app", "Code");

        let (path, app) = target(&params, &ctx()).unwrap();
        assert_eq!(path, "/other");
        assert_eq!(app, "Code");
    }

    #[test]
    fn test_target_requires_some_path() {
        let err = target(&ActionParams::new("open_project"), &ctx()).unwrap_err();
        assert!(matches!(err, ActionError::MissingParam("path")));
    }
}
