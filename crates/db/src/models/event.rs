use mission_core::{Event, EventPayload};

use super::{datetime_to_timestamp, timestamp_to_datetime};
use crate::error::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub id: String,
    pub mission_id: String,
    pub step_id: Option<String>,
    pub timestamp: i64,
    pub payload_json: String,
}

impl EventRow {
    pub fn into_domain(self) -> Result<Event, DbError> {
        let payload: EventPayload = serde_json::from_str(&self.payload_json)?;

        Ok(Event {
            event_id: self.id,
            mission_id: self.mission_id,
            step_id: self.step_id,
            timestamp: timestamp_to_datetime(self.timestamp),
            payload,
        })
    }

    pub fn try_from_domain(event: &Event) -> Result<Self, DbError> {
        Ok(Self {
            id: event.event_id.clone(),
            mission_id: event.mission_id.clone(),
            step_id: event.step_id.clone(),
            timestamp: datetime_to_timestamp(event.timestamp),
            payload_json: serde_json::to_string(&event.payload)?,
        })
    }
}
