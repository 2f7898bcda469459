use std::sync::Arc;

use db::{PlanStore, SqlitePlanStore};
use planner::PlanGenerator;
use sqlx::SqlitePool;

use crate::distributor::StepDistributor;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PlanStore>,
    pub planner: PlanGenerator,
}

impl AppState {
    pub fn new(store: Arc<dyn PlanStore>, planner: PlanGenerator) -> Self {
        Self { store, planner }
    }

    pub fn from_pool(pool: SqlitePool, planner: PlanGenerator) -> Self {
        Self::new(Arc::new(SqlitePlanStore::new(pool)), planner)
    }

    pub fn distributor(&self) -> StepDistributor {
        StepDistributor::new(self.store.clone())
    }
}
