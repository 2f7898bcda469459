use crate::error::DbError;
use crate::models::MissionRow;
use mission_core::{Mission, MissionStatus};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct MissionRepository {
    pool: SqlitePool,
}

impl MissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, mission: &Mission) -> Result<Mission, DbError> {
        let row = MissionRow::try_from_domain(mission)?;

        sqlx::query(
            r#"
            INSERT INTO missions (id, user, prompt, repo_path, worker_id, status, plan_json, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.user)
        .bind(&row.prompt)
        .bind(&row.repo_path)
        .bind(&row.worker_id)
        .bind(&row.status)
        .bind(&row.plan_json)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(mission_id = %mission.id, "Mission created");
        Ok(mission.clone())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Mission>, DbError> {
        let row: Option<MissionRow> = sqlx::query_as(
            r#"
            SELECT id, user, prompt, repo_path, worker_id, status, plan_json, created_at
            FROM missions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(MissionRow::into_domain).transpose()
    }

    pub async fn find_all(&self) -> Result<Vec<Mission>, DbError> {
        let rows: Vec<MissionRow> = sqlx::query_as(
            r#"
            SELECT id, user, prompt, repo_path, worker_id, status, plan_json, created_at
            FROM missions
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(MissionRow::into_domain).collect()
    }

    pub async fn exists(&self, id: &str) -> Result<bool, DbError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM missions WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0 > 0)
    }

    pub async fn update_status(&self, id: &str, status: MissionStatus) -> Result<bool, DbError> {
        let result = sqlx::query("UPDATE missions SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
