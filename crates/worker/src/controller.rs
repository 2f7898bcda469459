use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use coordinator_client::CoordinatorClient;
use mission_core::{EventStatus, Step};
use tokio_util::sync::CancellationToken;

use crate::config::WorkerConfig;
use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::executor::StepExecutor;
use crate::poll::sleep_or_cancel;
use crate::reporter::{EventDetails, EventReporter};

/// Consecutive empty polls after which the mission is considered done.
pub const MAX_EMPTY_POLLS: u32 = 3;
const MAX_ERROR_BACKOFF_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Polling,
    Executing,
    Backoff,
}

/// Wait after a step has been executed and reported.
pub fn after_step_wait(base: Duration) -> Duration {
    Duration::from_secs((base.as_secs() / 2).max(1))
}

/// Wait after the `count`-th consecutive empty poll.
pub fn empty_poll_wait(base: Duration, count: u32) -> Duration {
    if count >= MAX_EMPTY_POLLS {
        Duration::from_secs(base.as_secs() * 2)
    } else {
        Duration::from_secs(base.as_secs() + 2 * u64::from(count))
    }
}

pub fn error_wait(base: Duration) -> Duration {
    Duration::from_secs((base.as_secs() * 2).min(MAX_ERROR_BACKOFF_SECS))
}

/// Drives one worker: poll for the next step, execute it, report it.
pub struct MissionController {
    coordinator: Arc<dyn Coordinator>,
    executor: StepExecutor,
    reporter: EventReporter,
    worker_id: String,
    poll_interval: Duration,
    announce_start: bool,
    mission_id: Option<String>,
    repo_path: Option<PathBuf>,
    empty_polls: u32,
    state: ControllerState,
}

impl MissionController {
    pub fn new(
        config: &WorkerConfig,
        coordinator: Arc<dyn Coordinator>,
        executor: StepExecutor,
    ) -> Self {
        Self {
            reporter: EventReporter::new(coordinator.clone(), config.worker_id.clone()),
            coordinator,
            executor,
            worker_id: config.worker_id.clone(),
            poll_interval: config.poll_interval,
            announce_start: config.announce_start,
            mission_id: None,
            repo_path: None,
            empty_polls: 0,
            state: ControllerState::Idle,
        }
    }

    /// Controller talking HTTP to `config.coordinator_url` with the built-in handlers.
    pub fn from_config(config: &WorkerConfig, cancel: CancellationToken) -> Self {
        let coordinator = Arc::new(CoordinatorClient::new(&config.coordinator_url));
        let executor = StepExecutor::with_defaults(Arc::new(config.actions.clone()), cancel);
        Self::new(config, coordinator, executor)
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn mission_id(&self) -> Option<&str> {
        self.mission_id.as_deref()
    }

    pub fn repo_path(&self) -> Option<&PathBuf> {
        self.repo_path.as_ref()
    }

    pub fn empty_polls(&self) -> u32 {
        self.empty_polls
    }

    pub async fn set_mission(&mut self, mission_id: &str) {
        self.mission_id = Some(mission_id.to_string());
        self.repo_path = None;
        self.empty_polls = 0;
        self.state = ControllerState::Polling;

        match self.coordinator.get_mission(mission_id).await {
            Ok(mission) => {
                tracing::info!(
                    mission_id,
                    repo_path = %mission.repo_path,
                    steps = mission.plan.len(),
                    "Mission assigned"
                );
                self.repo_path = Some(PathBuf::from(mission.repo_path));
            }
            Err(e) => {
                tracing::warn!(mission_id, error = %e, "Could not fetch mission metadata");
            }
        }
    }

    /// One loop iteration. Returns how long to wait before the next one.
    pub async fn tick(&mut self) -> Result<Duration> {
        let Some(mission_id) = self.mission_id.clone() else {
            return Ok(self.on_empty_poll());
        };

        self.state = ControllerState::Polling;
        let step = match self.coordinator.next_step(&mission_id, &self.worker_id).await {
            Ok(step) => step,
            Err(e) if e.is_not_found() => {
                tracing::warn!(mission_id = %mission_id, "Coordinator does not know the mission, dropping it");
                self.clear_mission();
                return Ok(empty_poll_wait(self.poll_interval, MAX_EMPTY_POLLS));
            }
            Err(e) => return Err(e.into()),
        };

        match step {
            Some(step) => {
                self.empty_polls = 0;
                self.execute_step(&mission_id, step).await;
                self.state = ControllerState::Polling;
                Ok(after_step_wait(self.poll_interval))
            }
            None => Ok(self.on_empty_poll()),
        }
    }

    pub async fn run(&mut self, cancel: CancellationToken) {
        tracing::info!(
            worker_id = %self.worker_id,
            poll_interval_secs = self.poll_interval.as_secs(),
            "Mission controller started"
        );

        while !cancel.is_cancelled() {
            let wait = match self.tick().await {
                Ok(wait) => wait,
                Err(e) => {
                    let wait = error_wait(self.poll_interval);
                    tracing::error!(error = %e, wait_secs = wait.as_secs(), "Poll failed, backing off");
                    wait
                }
            };

            self.state = ControllerState::Backoff;
            if !sleep_or_cancel(wait, &cancel).await {
                break;
            }
        }

        tracing::info!(worker_id = %self.worker_id, "Mission controller stopped");
    }

    async fn execute_step(&mut self, mission_id: &str, step: Step) {
        self.state = ControllerState::Executing;

        if self.announce_start {
            self.reporter
                .report(mission_id, &step.step_id, EventStatus::Running, EventDetails::default())
                .await;
        }

        let result = self
            .executor
            .execute(&step, self.repo_path.as_deref())
            .await;
        let status = if result.success {
            EventStatus::Completed
        } else {
            EventStatus::Failed
        };

        self.reporter
            .report(mission_id, &step.step_id, status, EventDetails::from(&result))
            .await;
    }

    fn on_empty_poll(&mut self) -> Duration {
        self.empty_polls += 1;

        if self.empty_polls >= MAX_EMPTY_POLLS {
            if let Some(mission_id) = self.mission_id.take() {
                tracing::info!(mission_id = %mission_id, "No steps left, mission complete");
                self.repo_path = None;
            }
            self.state = ControllerState::Idle;
        } else {
            tracing::debug!(empty_polls = self.empty_polls, "No step available");
        }

        empty_poll_wait(self.poll_interval, self.empty_polls)
    }

    fn clear_mission(&mut self) {
        self.mission_id = None;
        self.repo_path = None;
        self.state = ControllerState::Idle;
    }
}
