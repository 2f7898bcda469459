use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use utoipa::ToSchema;

use crate::error::CoreError;

/// Ordered list of steps belonging to one mission.
///
/// Serialized as `{"mission_id": ..., "plan": [...]}`; the wire name of the
/// step list is `plan` for compatibility with existing planners and clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Plan {
    pub mission_id: String,
    #[serde(rename = "plan")]
    pub steps: Vec<Step>,
}

impl Plan {
    pub fn new(mission_id: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            mission_id: mission_id.into(),
            steps,
        }
    }

    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.step_id == step_id)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Structural checks a plan must pass before it is attached to a mission.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.mission_id.trim().is_empty() {
            return Err(CoreError::InvalidPlan("missing mission_id".to_string()));
        }
        if self.steps.is_empty() {
            return Err(CoreError::InvalidPlan("plan has no steps".to_string()));
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if step.step_id.trim().is_empty() {
                return Err(CoreError::InvalidPlan("step missing step_id".to_string()));
            }
            if !seen.insert(step.step_id.as_str()) {
                return Err(CoreError::InvalidPlan(format!(
                    "duplicate step_id: {}",
                    step.step_id
                )));
            }
            if step.actions.iter().any(|a| a.kind.trim().is_empty()) {
                return Err(CoreError::InvalidPlan(format!(
                    "step {} has an action without a type",
                    step.step_id
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Step {
    pub step_id: String,
    pub title: String,
    #[schema(value_type = Vec<Object>)]
    pub actions: Vec<Action>,
    /// Reserved for verification; carried through untouched.
    #[serde(default)]
    pub expect_marker: Option<String>,
}

impl Step {
    pub fn new(step_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            title: title.into(),
            actions: Vec::new(),
            expect_marker: None,
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_expect_marker(mut self, marker: impl Into<String>) -> Self {
        self.expect_marker = Some(marker.into());
        self
    }
}

/// A tagged record `{"type": ..., ...params}`.
///
/// The type is kept as a string so plans with action types this build does
/// not know still store and round-trip unchanged. Workers resolve it to a
/// handler at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl Action {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    pub fn param_u64(&self, key: &str) -> Option<u64> {
        self.params.get(key).and_then(Value::as_u64)
    }

    /// Accepts either a JSON array of strings or a single string.
    pub fn param_str_list(&self, key: &str) -> Option<Vec<String>> {
        match self.params.get(key)? {
            Value::Array(items) => Some(
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
            ),
            Value::String(s) => Some(vec![s.clone()]),
            _ => None,
        }
    }
}
