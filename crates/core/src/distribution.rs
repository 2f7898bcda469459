//! Read-model over a mission's event log.
//!
//! Step completion is never stored as a flag: a step counts as done once the
//! log holds at least one event for it, whatever that event's status.

use std::collections::{HashMap, HashSet};

use crate::domain::{Event, EventStatus, MissionStatus, Plan, Step};

/// Step ids that have at least one event recorded.
pub fn completed_step_ids<'a, I>(events: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a Event>,
{
    events
        .into_iter()
        .filter_map(|e| e.step_id.clone())
        .collect()
}

/// First step, in plan order, with no recorded event. `None` once the plan is exhausted.
pub fn next_pending_step<'a>(plan: &'a Plan, completed: &HashSet<String>) -> Option<&'a Step> {
    plan.steps
        .iter()
        .find(|step| !completed.contains(&step.step_id))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_exhausted(&self) -> bool {
        self.completed >= self.total
    }
}

pub fn progress(plan: &Plan, completed: &HashSet<String>) -> Progress {
    let done = plan
        .steps
        .iter()
        .filter(|step| completed.contains(&step.step_id))
        .count();

    Progress {
        completed: done,
        total: plan.steps.len(),
    }
}

/// Status of the most recent event of each step, `events` in append order.
pub fn latest_step_statuses<'a, I>(events: I) -> HashMap<String, EventStatus>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut latest = HashMap::new();
    for event in events {
        if let Some(step_id) = &event.step_id {
            latest.insert(step_id.clone(), event.payload.status);
        }
    }
    latest
}

/// Advisory mission status from each step's latest event status.
///
/// `done` when every step has an event and no latest event is `failed`;
/// `failed` when every step has an event and at least one latest event is;
/// otherwise `running` (or `pending` before any step has reported).
pub fn derive_status(plan: &Plan, latest: &HashMap<String, EventStatus>) -> MissionStatus {
    if latest.is_empty() {
        return MissionStatus::Pending;
    }

    let all_reported = plan
        .steps
        .iter()
        .all(|step| latest.contains_key(step.step_id.as_str()));
    if !all_reported {
        return MissionStatus::Running;
    }

    let any_failed = plan.steps.iter().any(|step| {
        latest.get(step.step_id.as_str()) == Some(&EventStatus::Failed)
    });

    if any_failed {
        MissionStatus::Failed
    } else {
        MissionStatus::Done
    }
}
