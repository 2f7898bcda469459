use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use super::process::{escape_applescript, run_applescript};
use super::{required_str, timeout_param, ActionContext, ActionHandler, ActionParams, ActionResult};
use super::{FallbackChain, Strategy};
use crate::error::ActionError;
use crate::poll::{poll_until, sleep_or_cancel};

const SCRIPT_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_BLIND_WAIT: Duration = Duration::from_secs(12);
const FILE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Files whose presence suggests the AI has scaffolded a project.
pub const PROJECT_MARKER_FILES: [&str; 6] = [
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "requirements.txt",
    "Pipfile",
    ".gitignore",
];

/// Types a prompt into the IDE's AI chat and waits for the AI to finish.
///
/// The same prompt repeated within the de-duplication window is skipped and
/// reported as success.
pub struct PromptAiHandler {
    chain: FallbackChain,
}

impl PromptAiHandler {
    pub fn new() -> Self {
        Self {
            chain: FallbackChain::new()
                .then(ChatInput {
                    name: "ui element",
                    locate: LOCATE_BY_ELEMENT,
                })
                .then(ChatInput {
                    name: "window coordinates",
                    locate: LOCATE_BY_COORDINATES,
                }),
        }
    }
}

impl Default for PromptAiHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ActionHandler for PromptAiHandler {
    async fn run(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let prompt = required_str(params, "prompt")?;

        if !ctx.prompt_dedup.admit(prompt) {
            tracing::warn!(prompt = %preview(prompt), "Duplicate prompt skipped");
            return Ok(ActionResult::ok("Duplicate prompt skipped"));
        }

        tracing::info!(prompt = %preview(prompt), "Sending prompt to AI chat");
        let mut result = self.chain.run(params, ctx).await?;
        if !result.success {
            return Ok(result.with_stdout("Failed to send prompt to AI chat"));
        }

        let expected = params.param_str_list("expected_files").unwrap_or_default();
        let timeout = timeout_param(params, "wait_timeout", DEFAULT_WAIT_TIMEOUT);

        match wait_for_completion(ctx, &expected, timeout).await {
            Some(path) => result.append_stdout(&format!(
                "AI work completion detected: {}",
                path.display()
            )),
            None => result.append_stdout("AI completion wait finished without detecting files"),
        }

        Ok(result)
    }
}

/// Bounded wait for the AI to produce output.
///
/// Waits for any of `expected_files` first. Failing that, waits a capped
/// amount of time and checks the repository for common project files.
/// Returns the file that signalled completion, if any.
pub async fn wait_for_completion(
    ctx: &ActionContext,
    expected_files: &[String],
    timeout: Duration,
) -> Option<PathBuf> {
    let candidates: Vec<PathBuf> = expected_files
        .iter()
        .filter_map(|f| ctx.resolve_path(f).ok())
        .collect();

    if !candidates.is_empty() {
        let found = poll_until(timeout, FILE_POLL_INTERVAL, &ctx.cancel, || {
            let candidates = candidates.clone();
            async move {
                for path in candidates {
                    if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                        return Some(path);
                    }
                }
                None
            }
        })
        .await;

        if let Some(path) = found.ready() {
            tracing::info!(path = %path.display(), "Expected file created");
            return Some(path);
        }
    }

    if !sleep_or_cancel(timeout.min(MAX_BLIND_WAIT), &ctx.cancel).await {
        return None;
    }

    let root = ctx.repo_path()?;
    for name in PROJECT_MARKER_FILES {
        let path = root.join(name);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::info!(file = name, "Detected project file");
            return Some(path);
        }
    }

    None
}

fn preview(prompt: &str) -> String {
    prompt.chars().take(80).collect()
}

/// AppleScript that focuses the chat input inside `tell process`.
const LOCATE_BY_ELEMENT: &str = r#"set inputFields to (every text field) & (every text area)
        set clicked to false
        repeat with inputField in inputFields
            try
                set fieldDesc to description of inputField as string
                set fieldValue to value of inputField as string
                if fieldValue is "" or fieldDesc contains "input" or fieldDesc contains "question" or fieldDesc contains "task" then
                    click inputField
                    set clicked to true
                    exit repeat
                end if
            end try
        end repeat
        if not clicked then
            if (count of inputFields) is 0 then error "no chat input found"
            click (item -1 of inputFields)
        end if"#;

const LOCATE_BY_COORDINATES: &str = r#"set windowBounds to bounds of window 1
        set windowWidth to (item 3 of windowBounds) - (item 1 of windowBounds)
        set windowHeight to (item 4 of windowBounds) - (item 2 of windowBounds)
        set clickX to (item 1 of windowBounds) + windowWidth * 0.75
        set clickY to (item 2 of windowBounds) + windowHeight * 0.85
        click at {clickX, clickY}"#;

/// Opens the chat panel, focuses its input using `locate` and submits the prompt.
struct ChatInput {
    name: &'static str,
    locate: &'static str,
}

impl ChatInput {
    fn script(&self, app: &str, prompt: &str) -> String {
        let app = escape_applescript(app);
        format!(
            r#"tell application "{app}" to activate
delay 0.5
tell application "System Events"
    tell process "{app}"
        set frontmost to true
        keystroke "l" using command down
        delay 1.0
        {locate}
        delay 0.3
        keystroke "a" using command down
        key code 51
        keystroke "{prompt}"
        delay 0.2
        key code 36
    end tell
end tell"#,
            app = app,
            locate = self.locate,
            prompt = escape_applescript(prompt),
        )
    }
}

#[async_trait]
impl Strategy for ChatInput {
    fn name(&self) -> &str {
        self.name
    }

    async fn attempt(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let prompt = required_str(params, "prompt")?;
        let script = self.script(&ctx.settings.ide_app, prompt);

        let output = run_applescript(&script, SCRIPT_TIMEOUT).await?;
        if !output.success {
            return Ok(ActionResult::failure(format!(
                "Chat input via {} failed: {}",
                self.name,
                output.stderr.trim()
            )));
        }

        ctx.settle().await;
        Ok(ActionResult::ok(format!(
            "Sent prompt to AI chat: {}",
            preview(prompt)
        )))
    }
}
