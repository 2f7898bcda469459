use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use planner::PlannerConfig;
use serde::{Deserialize, Serialize};
use worker::config::{
    ActionSettings, DEFAULT_COORDINATOR_URL, DEFAULT_IDE_APP, DEFAULT_POLL_INTERVAL,
};
use worker::WorkerConfig;

pub const CONFIG_FILE: &str = "mission-control.toml";
pub const DEFAULT_PORT: u16 = 5757;
pub const DEFAULT_DATABASE_URL: &str = "sqlite:mission-control.db";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub coordinator: CoordinatorSection,
    pub planner: PlannerConfig,
    pub worker: WorkerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorSection {
    pub port: u16,
    pub database_url: String,
}

impl Default for CoordinatorSection {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSection {
    pub worker_id: String,
    pub coordinator_url: String,
    pub poll_interval_secs: u64,
    pub ide_app: String,
    pub announce_start: bool,
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self {
            worker_id: mission_core::DEFAULT_WORKER_ID.to_string(),
            coordinator_url: DEFAULT_COORDINATOR_URL.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            ide_app: DEFAULT_IDE_APP.to_string(),
            announce_start: true,
        }
    }
}

impl Config {
    /// Reads `path`, or `mission-control.toml` in the working directory when it
    /// exists, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Some(PathBuf::from(CONFIG_FILE)).filter(|p| p.exists()),
        };

        let mut config = match path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().find_map(|&key| lookup(key));

        if let Some(worker_id) = first(&["WORKER_ID", "MAC_ID"]) {
            self.worker.worker_id = worker_id;
        }
        if let Some(url) = first(&["COORDINATOR_URL", "BACKEND_URL"]) {
            self.worker.coordinator_url = url;
        }
        if let Some(interval) = first(&["POLL_INTERVAL"]) {
            self.worker.poll_interval_secs = interval
                .trim()
                .parse()
                .with_context(|| format!("POLL_INTERVAL must be whole seconds, got '{}'", interval))?;
        }
        if let Some(key) = first(&["GEMINI_API_KEY"]) {
            self.planner.api_key = Some(key);
        }
        if let Some(model) = first(&["GEMINI_MODEL"]) {
            self.planner.model = model;
        }
        if let Some(url) = first(&["DATABASE_URL"]) {
            self.coordinator.database_url = url;
        }
        Ok(())
    }

    /// Contents `init` writes: defaults only, never environment overrides.
    pub fn template() -> Result<String> {
        toml::to_string_pretty(&Self::default()).context("Failed to render default config")
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            worker_id: self.worker.worker_id.clone(),
            coordinator_url: self.worker.coordinator_url.clone(),
            poll_interval: Duration::from_secs(self.worker.poll_interval_secs.max(1)),
            announce_start: self.worker.announce_start,
            actions: ActionSettings {
                ide_app: self.worker.ide_app.clone(),
                ..ActionSettings::default()
            },
        }
    }
}
