use std::sync::Arc;

use db::PlanStore;
use mission_core::{next_pending_step, progress, Step};

use crate::error::AppError;

/// Decides which step a polling worker should run next.
///
/// A step counts as done once any event names it, so a failed step is never
/// offered again. Two workers polling the same mission may both receive the
/// same step; there is no lease.
#[derive(Clone)]
pub struct StepDistributor {
    store: Arc<dyn PlanStore>,
}

impl StepDistributor {
    pub fn new(store: Arc<dyn PlanStore>) -> Self {
        Self { store }
    }

    pub async fn next_step(&self, mission_id: &str) -> Result<Option<Step>, AppError> {
        let mission = self
            .store
            .find_mission(mission_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Mission not found: {}", mission_id)))?;

        let reported = self.store.reported_step_ids(mission_id).await?;
        let next = next_pending_step(&mission.plan, &reported).cloned();

        let p = progress(&mission.plan, &reported);
        match &next {
            Some(step) => tracing::debug!(
                mission_id = %mission_id,
                step_id = %step.step_id,
                completed = p.completed,
                total = p.total,
                "Next step selected"
            ),
            None => tracing::debug!(
                mission_id = %mission_id,
                total = p.total,
                "Plan exhausted"
            ),
        }

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use db::{create_pool, run_migrations, SqlitePlanStore};
    use mission_core::{Event, EventPayload, EventStatus, Mission, Plan};

    async fn setup() -> (StepDistributor, Arc<dyn PlanStore>) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let store: Arc<dyn PlanStore> = Arc::new(SqlitePlanStore::new(pool));

        let plan = Plan::new(
            "m-dist0001",
            vec![
                Step::new("s-1", "First"),
                Step::new("s-2", "Second"),
                Step::new("s-3", "Third"),
            ],
        );
        store
            .create_mission(&Mission::new("m-dist0001", "alice", "p", "/tmp", plan))
            .await
            .unwrap();

        (StepDistributor::new(store.clone()), store)
    }

    async fn report(store: &Arc<dyn PlanStore>, step_id: &str, status: EventStatus) {
        let event = Event::new(
            mission_core::new_event_id(),
            "m-dist0001",
            Some(step_id.to_string()),
            EventPayload::new("worker-01", status),
        );
        store.append_event(&event).await.unwrap();
    }

    #[tokio::test]
    async fn test_first_unreported_step_in_plan_order() {
        let (distributor, store) = setup().await;

        let step = distributor.next_step("m-dist0001").await.unwrap().unwrap();
        assert_eq!(step.step_id, "s-1");

        // Out-of-order report: s-2 is skipped, s-1 is still first.
        report(&store, "s-2", EventStatus::Completed).await;
        let step = distributor.next_step("m-dist0001").await.unwrap().unwrap();
        assert_eq!(step.step_id, "s-1");

        report(&store, "s-1", EventStatus::Failed).await;
        let step = distributor.next_step("m-dist0001").await.unwrap().unwrap();
        assert_eq!(step.step_id, "s-3");
    }

    #[tokio::test]
    async fn test_running_event_marks_step_done() {
        let (distributor, store) = setup().await;

        report(&store, "s-1", EventStatus::Running).await;
        let step = distributor.next_step("m-dist0001").await.unwrap().unwrap();
        assert_eq!(step.step_id, "s-2");
    }

    #[tokio::test]
    async fn test_exhausted_and_idempotent() {
        let (distributor, store) = setup().await;
        for id in ["s-1", "s-2", "s-3"] {
            report(&store, id, EventStatus::Completed).await;
        }

        assert!(distributor.next_step("m-dist0001").await.unwrap().is_none());
        assert!(distributor.next_step("m-dist0001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_mission() {
        let (distributor, _store) = setup().await;

        let err = distributor.next_step("m-missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
