use std::sync::Arc;

use async_trait::async_trait;
use mission_core::Plan;
use tracing::{info, warn};

use crate::error::PlannerResult;
use crate::fallback::static_plan;

#[derive(Debug, Clone)]
pub struct PlanRequest {
    pub mission_id: String,
    pub prompt: String,
    pub repo_path: String,
}

impl PlanRequest {
    pub fn new(
        mission_id: impl Into<String>,
        prompt: impl Into<String>,
        repo_path: impl Into<String>,
    ) -> Self {
        Self {
            mission_id: mission_id.into(),
            prompt: prompt.into(),
            repo_path: repo_path.into(),
        }
    }
}

/// Source of structured plans for natural-language requests.
#[async_trait]
pub trait Planner: Send + Sync {
    fn name(&self) -> &str;

    async fn plan(&self, request: &PlanRequest) -> PlannerResult<Plan>;
}

/// Infallible front of the planner used at mission intake.
#[derive(Clone, Default)]
pub struct PlanGenerator {
    planner: Option<Arc<dyn Planner>>,
}

impl PlanGenerator {
    pub fn new(planner: Arc<dyn Planner>) -> Self {
        Self {
            planner: Some(planner),
        }
    }

    /// Generator that always hands out the static plan.
    pub fn static_only() -> Self {
        Self { planner: None }
    }

    pub fn has_planner(&self) -> bool {
        self.planner.is_some()
    }

    pub async fn generate(&self, request: &PlanRequest) -> Plan {
        let Some(planner) = &self.planner else {
            warn!(
                mission_id = %request.mission_id,
                "No planner configured, using static fallback plan"
            );
            return static_plan(&request.mission_id, &request.repo_path);
        };

        match planner.plan(request).await {
            Ok(plan) => {
                info!(
                    mission_id = %request.mission_id,
                    planner = planner.name(),
                    steps = plan.len(),
                    "Generated plan"
                );
                plan
            }
            Err(e) => {
                warn!(
                    mission_id = %request.mission_id,
                    planner = planner.name(),
                    error = %e,
                    "Planner failed, using static fallback plan"
                );
                static_plan(&request.mission_id, &request.repo_path)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlannerError;
    use mission_core::{Action, Step};

    struct FixedPlanner(PlannerResult<Plan>);

    #[async_trait]
    impl Planner for FixedPlanner {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn plan(&self, _request: &PlanRequest) -> PlannerResult<Plan> {
            match &self.0 {
                Ok(plan) => Ok(plan.clone()),
                Err(_) => Err(PlannerError::EmptyResponse),
            }
        }
    }

    fn request() -> PlanRequest {
        PlanRequest::new("m-0000abcd", "add a button", "/work/app")
    }

    #[tokio::test]
    async fn test_static_only_uses_fallback() {
        let plan = PlanGenerator::static_only().generate(&request()).await;
        assert_eq!(plan, static_plan("m-0000abcd", "/work/app"));
    }

    #[tokio::test]
    async fn test_planner_failure_uses_fallback() {
        let generator = PlanGenerator::new(Arc::new(FixedPlanner(Err(PlannerError::EmptyResponse))));
        let plan = generator.generate(&request()).await;

        let ids: Vec<_> = plan.steps.iter().map(|s| s.step_id.as_str()).collect();
        assert_eq!(ids, ["s-1", "s-2"]);
    }

    #[tokio::test]
    async fn test_planner_success_is_used() {
        let custom = Plan::new(
            "m-0000abcd",
            vec![Step::new("s-1", "Only").with_action(Action::new("screenshot"))],
        );
        let generator = PlanGenerator::new(Arc::new(FixedPlanner(Ok(custom.clone()))));

        assert!(generator.has_planner());
        assert_eq!(generator.generate(&request()).await, custom);
    }
}
