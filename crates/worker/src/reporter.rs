use std::sync::Arc;

use mission_core::{EventStatus, NewEvent};

use crate::coordinator::Coordinator;
use crate::executor::ExecutionResult;

/// Optional outputs attached to an event.
#[derive(Debug, Clone, Default)]
pub struct EventDetails {
    pub stdout: String,
    pub stderr: String,
    pub screenshots: Vec<String>,
    pub found_markers: Vec<String>,
}

impl From<&ExecutionResult> for EventDetails {
    fn from(result: &ExecutionResult) -> Self {
        let mut stderr = result.stderr.clone();
        for error in &result.errors {
            if !stderr.is_empty() {
                stderr.push('\n');
            }
            stderr.push_str(error);
        }

        Self {
            stdout: result.stdout.clone(),
            stderr,
            screenshots: result.screenshots.clone(),
            found_markers: result.found_markers.clone(),
        }
    }
}

/// Posts step events to the coordinator. Failures are logged, never retried.
pub struct EventReporter {
    coordinator: Arc<dyn Coordinator>,
    worker_id: String,
}

impl EventReporter {
    pub fn new(coordinator: Arc<dyn Coordinator>, worker_id: impl Into<String>) -> Self {
        Self {
            coordinator,
            worker_id: worker_id.into(),
        }
    }

    pub async fn report(
        &self,
        mission_id: &str,
        step_id: &str,
        status: EventStatus,
        details: EventDetails,
    ) -> bool {
        let event = NewEvent {
            stdout: Some(details.stdout),
            stderr: Some(details.stderr),
            screenshots: Some(details.screenshots),
            found_markers: Some(details.found_markers),
            ..NewEvent::new(&self.worker_id, step_id, status)
        };

        match self.coordinator.post_event(mission_id, &event).await {
            Ok(ack) => {
                tracing::info!(
                    mission_id,
                    step_id,
                    status = status.as_str(),
                    event_id = %ack.event_id,
                    "Event reported"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    mission_id,
                    step_id,
                    status = status.as_str(),
                    error = %e,
                    "Failed to report event"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_include_errors_in_stderr() {
        let result = ExecutionResult {
            step_id: "s-1".to_string(),
            success: false,
            stdout: "out".to_string(),
            stderr: "warn".to_string(),
            screenshots: vec!["data:image/png;base64,AA".to_string()],
            errors: vec!["Action open_app failed: nope".to_string()],
            found_markers: vec![],
        };

        let details = EventDetails::from(&result);

        assert_eq!(details.stdout, "out");
        assert_eq!(details.stderr, "warn\nAction open_app failed: nope");
        assert_eq!(details.screenshots.len(), 1);
    }
}
