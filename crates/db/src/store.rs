use async_trait::async_trait;
use mission_core::{Event, EventStatus, Mission, MissionStatus};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};

use crate::error::DbError;
use crate::repositories::{EventRepository, MissionRepository};

/// Durable record of missions and their append-only event log.
///
/// Every write has been committed by the time the returned future resolves.
#[async_trait]
pub trait PlanStore: Send + Sync {
    async fn create_mission(&self, mission: &Mission) -> Result<(), DbError>;

    async fn find_mission(&self, id: &str) -> Result<Option<Mission>, DbError>;

    async fn list_missions(&self) -> Result<Vec<Mission>, DbError>;

    async fn set_status(&self, id: &str, status: MissionStatus) -> Result<bool, DbError>;

    /// Fails with [`DbError::MissionNotFound`] and writes nothing if the mission is unknown.
    async fn append_event(&self, event: &Event) -> Result<(), DbError>;

    async fn events(&self, mission_id: &str) -> Result<Vec<Event>, DbError>;

    /// Step ids with at least one event, whatever their status.
    async fn reported_step_ids(&self, mission_id: &str) -> Result<HashSet<String>, DbError>;

    /// Status of each reported step's most recent event.
    async fn latest_step_statuses(
        &self,
        mission_id: &str,
    ) -> Result<HashMap<String, EventStatus>, DbError>;
}

#[derive(Clone)]
pub struct SqlitePlanStore {
    missions: MissionRepository,
    events: EventRepository,
}

impl SqlitePlanStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            missions: MissionRepository::new(pool.clone()),
            events: EventRepository::new(pool),
        }
    }
}

#[async_trait]
impl PlanStore for SqlitePlanStore {
    async fn create_mission(&self, mission: &Mission) -> Result<(), DbError> {
        self.missions.create(mission).await.map(|_| ())
    }

    async fn find_mission(&self, id: &str) -> Result<Option<Mission>, DbError> {
        self.missions.find_by_id(id).await
    }

    async fn list_missions(&self) -> Result<Vec<Mission>, DbError> {
        self.missions.find_all().await
    }

    async fn set_status(&self, id: &str, status: MissionStatus) -> Result<bool, DbError> {
        self.missions.update_status(id, status).await
    }

    async fn append_event(&self, event: &Event) -> Result<(), DbError> {
        self.events.append(event).await.map(|_| ())
    }

    async fn events(&self, mission_id: &str) -> Result<Vec<Event>, DbError> {
        self.events.find_by_mission_id(mission_id).await
    }

    async fn reported_step_ids(&self, mission_id: &str) -> Result<HashSet<String>, DbError> {
        self.events.find_step_ids(mission_id).await
    }

    async fn latest_step_statuses(
        &self,
        mission_id: &str,
    ) -> Result<HashMap<String, EventStatus>, DbError> {
        self.events.find_latest_statuses(mission_id).await
    }
}
