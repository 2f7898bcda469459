use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::ActionError;

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Runs `program` to completion, killing it if it outlives `timeout`.
pub async fn run_program(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<CommandOutput, ActionError> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }

    let child = command.spawn().map_err(|source| ActionError::Spawn {
        program: program.to_string(),
        source,
    })?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => output?,
        Err(_) => {
            return Err(ActionError::Timeout {
                program: program.to_string(),
                seconds: timeout.as_secs(),
            })
        }
    };

    let result = CommandOutput {
        success: output.status.success(),
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };

    tracing::debug!(program, code = ?result.code, "Process finished");
    Ok(result)
}

/// Runs an AppleScript snippet through `osascript`.
pub(crate) async fn run_applescript(
    script: &str,
    timeout: Duration,
) -> Result<CommandOutput, ActionError> {
    run_program("osascript", &["-e", script], None, timeout).await
}

/// Escapes text for embedding in a double-quoted AppleScript string.
pub fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}
