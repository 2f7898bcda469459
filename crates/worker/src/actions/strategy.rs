use async_trait::async_trait;

use super::{ActionContext, ActionParams, ActionResult};
use crate::error::ActionError;

/// One way of carrying out an action.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    async fn attempt(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError>;
}

/// Ordered list of strategies tried until one succeeds.
///
/// Only the last attempt's outcome is returned; an `Err` from an earlier
/// strategy is logged and treated as a failed attempt.
#[derive(Default)]
pub struct FallbackChain {
    strategies: Vec<Box<dyn Strategy>>,
}

impl FallbackChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, strategy: impl Strategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub async fn run(
        &self,
        params: &ActionParams,
        ctx: &mut ActionContext,
    ) -> Result<ActionResult, ActionError> {
        let mut last = Ok(ActionResult::failure("No strategies configured"));

        for (index, strategy) in self.strategies.iter().enumerate() {
            if index > 0 && ctx.cancel.is_cancelled() {
                return Err(ActionError::Cancelled);
            }

            let outcome = strategy.attempt(params, ctx).await;
            match &outcome {
                Ok(result) if result.success => {
                    tracing::debug!(
                        action = %params.kind,
                        strategy = strategy.name(),
                        "Strategy succeeded"
                    );
                    return outcome;
                }
                Ok(result) => tracing::warn!(
                    action = %params.kind,
                    strategy = strategy.name(),
                    error = result.error.as_deref().unwrap_or("unknown"),
                    "Strategy failed"
                ),
                Err(e) => tracing::warn!(
                    action = %params.kind,
                    strategy = strategy.name(),
                    error = %e,
                    "Strategy errored"
                ),
            }
            last = outcome;
        }

        last
    }
}
