use crate::error::DbError;
use crate::models::EventRow;
use mission_core::{Event, EventStatus};
use sqlx::SqlitePool;
use std::collections::{HashMap, HashSet};

/// Append-only access to the event log. There is deliberately no update or delete.
#[derive(Clone)]
pub struct EventRepository {
    pool: SqlitePool,
}

impl EventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Appends an event; fails with `MissionNotFound` without writing if the mission is unknown.
    pub async fn append(&self, event: &Event) -> Result<Event, DbError> {
        let row = EventRow::try_from_domain(event)?;

        let result = sqlx::query(
            r#"
            INSERT INTO events (id, mission_id, step_id, timestamp, payload_json)
            SELECT ?, ?, ?, ?, ?
            WHERE EXISTS (SELECT 1 FROM missions WHERE id = ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.mission_id)
        .bind(&row.step_id)
        .bind(row.timestamp)
        .bind(&row.payload_json)
        .bind(&row.mission_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::MissionNotFound(event.mission_id.clone()));
        }

        tracing::debug!(
            event_id = %event.event_id,
            mission_id = %event.mission_id,
            step_id = ?event.step_id,
            "Event appended"
        );
        Ok(event.clone())
    }

    /// Events of a mission in append order.
    pub async fn find_by_mission_id(&self, mission_id: &str) -> Result<Vec<Event>, DbError> {
        let rows: Vec<EventRow> = sqlx::query_as(
            r#"
            SELECT id, mission_id, step_id, timestamp, payload_json
            FROM events
            WHERE mission_id = ?
            ORDER BY rowid ASC
            "#,
        )
        .bind(mission_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(EventRow::into_domain).collect()
    }

    pub async fn find_step_ids(&self, mission_id: &str) -> Result<HashSet<String>, DbError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT step_id
            FROM events
            WHERE mission_id = ? AND step_id IS NOT NULL
            "#,
        )
        .bind(mission_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Status of each step's most recent event, read without decoding payloads.
    pub async fn find_latest_statuses(
        &self,
        mission_id: &str,
    ) -> Result<HashMap<String, EventStatus>, DbError> {
        let rows: Vec<(String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT step_id, json_extract(payload_json, '$.status')
            FROM events
            WHERE mission_id = ? AND step_id IS NOT NULL
            ORDER BY rowid ASC
            "#,
        )
        .bind(mission_id)
        .fetch_all(&self.pool)
        .await?;

        let mut latest = HashMap::new();
        for (step_id, status) in rows {
            match status.as_deref().and_then(EventStatus::parse) {
                Some(status) => {
                    latest.insert(step_id, status);
                }
                None => tracing::warn!(
                    mission_id,
                    step_id = %step_id,
                    "Event with unreadable status skipped"
                ),
            }
        }
        Ok(latest)
    }
}
