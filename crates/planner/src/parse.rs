use mission_core::Plan;

use crate::error::{PlannerError, PlannerResult};

/// Turns raw planner text into a validated plan for `mission_id`.
///
/// Markdown code fences around the JSON are tolerated. The plan's
/// `mission_id` must be present but is always rewritten to the mission it is
/// being attached to.
pub fn parse_plan_response(text: &str, mission_id: &str) -> PlannerResult<Plan> {
    let body = strip_code_fence(text);
    let mut plan: Plan = serde_json::from_str(body)?;

    plan.validate()
        .map_err(|e| PlannerError::InvalidPlan(e.to_string()))?;
    if plan.mission_id != mission_id {
        tracing::debug!(
            returned = %plan.mission_id,
            expected = %mission_id,
            "Planner echoed a different mission id"
        );
        plan.mission_id = mission_id.to_string();
    }

    Ok(plan)
}

fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}
