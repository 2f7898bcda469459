use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use uuid::Uuid;

use super::process::run_program;
use super::{ActionContext, ActionHandler, ActionParams, ActionResult};
use super::{FallbackChain, Strategy};
use crate::error::ActionError;

pub const SCREENSHOT_DATA_URI_PREFIX: &str = "data:image/png;base64,";

const CAPTURE_TIMEOUT: Duration = Duration::from_secs(15);

/// Captures the screen as a PNG data URI, trying each capture tool in turn.
pub struct ScreenshotHandler {
    chain: FallbackChain,
}

impl ScreenshotHandler {
    pub fn new() -> Self {
        Self {
            chain: FallbackChain::new()
                .then(CaptureTool {
                    program: "screencapture",
                    args: |path| vec!["-x".to_string(), path.to_string()],
                })
                .then(CaptureTool {
                    program: "gnome-screenshot",
                    args: |path| vec!["-f".to_string(), path.to_string()],
                })
                .then(CaptureTool {
                    program: "import",
                    args: |path| vec!["-window".to_string(), "root".to_string(), path.to_string()],
                }),
        }
    }
}

impl Default for ScreenshotHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionHandler for ScreenshotHandler {
    async fn run(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let result = self.chain.run(params, ctx).await?;
        if result.success {
            Ok(result)
        } else {
            Ok(result.with_stdout("Failed to capture screenshot"))
        }
    }
}

struct CaptureTool {
    program: &'static str,
    args: fn(&str) -> Vec<String>,
}

#[async_trait]
impl Strategy for CaptureTool {
    fn name(&self) -> &str {
        self.program
    }

    async fn attempt(
        &self,
        _params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let path = capture_path(&ctx.settings.screenshot_dir, self.program);
        let path_str = path.to_string_lossy();
        let args = (self.args)(&path_str);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        let output = match run_program(self.program, &args, None, CAPTURE_TIMEOUT).await {
            Ok(output) => output,
            Err(ActionError::Spawn { .. }) => {
                return Ok(ActionResult::failure(format!(
                    "{} is not available",
                    self.program
                )))
            }
            Err(e) => return Err(e),
        };
        if !output.success {
            return Ok(ActionResult::failure(format!(
                "{} failed: {}",
                self.program,
                output.stderr.trim()
            )));
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => bytes,
            _ => {
                return Ok(ActionResult::failure(format!(
                    "{} produced no image",
                    self.program
                )))
            }
        };
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::debug!(path = %path.display(), error = %e, "Could not remove screenshot file");
        }

        Ok(ActionResult::ok("Screenshot captured").with_screenshot(to_data_uri(&bytes)))
    }
}

fn capture_path(dir: &Path, program: &str) -> PathBuf {
    dir.join(format!("screenshot-{}-{}.png", program, Uuid::new_v4()))
}

pub(crate) fn to_data_uri(png: &[u8]) -> String {
    format!("{}{}", SCREENSHOT_DATA_URI_PREFIX, STANDARD.encode(png))
}
