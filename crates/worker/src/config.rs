use std::path::PathBuf;
use std::time::Duration;

use mission_core::DEFAULT_WORKER_ID;

pub const DEFAULT_COORDINATOR_URL: &str = "http://localhost:5757";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_IDE_APP: &str = "Kiro";
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub worker_id: String,
    pub coordinator_url: String,
    /// Base interval every loop wait is derived from.
    pub poll_interval: Duration,
    /// Report a `running` event before a step executes.
    pub announce_start: bool,
    pub actions: ActionSettings,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: DEFAULT_WORKER_ID.to_string(),
            coordinator_url: DEFAULT_COORDINATOR_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            announce_start: true,
            actions: ActionSettings::default(),
        }
    }
}

/// Platform knobs shared by the built-in action handlers.
#[derive(Debug, Clone)]
pub struct ActionSettings {
    /// Application that hosts projects and the AI chat.
    pub ide_app: String,
    pub command_timeout: Duration,
    /// Pause after UI actions so the target application can catch up.
    pub settle_delay: Duration,
    pub screenshot_dir: PathBuf,
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            ide_app: DEFAULT_IDE_APP.to_string(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            settle_delay: Duration::from_millis(500),
            screenshot_dir: std::env::temp_dir(),
        }
    }
}

impl ActionSettings {
    /// Settings without UI pauses, for tests and headless runs.
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}
