use mission_core::{Mission, MissionStatus, Plan};

use super::{datetime_to_timestamp, timestamp_to_datetime};
use crate::error::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MissionRow {
    pub id: String,
    pub user: String,
    pub prompt: String,
    pub repo_path: String,
    pub worker_id: String,
    pub status: String,
    pub plan_json: String,
    pub created_at: i64,
}

impl MissionRow {
    pub fn into_domain(self) -> Result<Mission, DbError> {
        let plan: Plan = serde_json::from_str(&self.plan_json)?;

        Ok(Mission {
            id: self.id,
            user: self.user,
            prompt: self.prompt,
            repo_path: self.repo_path,
            worker_id: self.worker_id,
            status: MissionStatus::parse(&self.status).unwrap_or_default(),
            plan,
            created_at: timestamp_to_datetime(self.created_at),
        })
    }

    pub fn try_from_domain(mission: &Mission) -> Result<Self, DbError> {
        Ok(Self {
            id: mission.id.clone(),
            user: mission.user.clone(),
            prompt: mission.prompt.clone(),
            repo_path: mission.repo_path.clone(),
            worker_id: mission.worker_id.clone(),
            status: mission.status.as_str().to_string(),
            plan_json: serde_json::to_string(&mission.plan)?,
            created_at: datetime_to_timestamp(mission.created_at),
        })
    }
}
