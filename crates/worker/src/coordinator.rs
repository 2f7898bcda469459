use async_trait::async_trait;
use coordinator_client::{ClientError, CoordinatorClient};
use mission_core::{EventAck, Mission, NewEvent, Step};

/// The slice of the coordinator API a worker depends on.
#[async_trait]
pub trait Coordinator: Send + Sync {
    async fn get_mission(&self, mission_id: &str) -> Result<Mission, ClientError>;

    async fn next_step(&self, mission_id: &str, worker_id: &str)
        -> Result<Option<Step>, ClientError>;

    async fn post_event(&self, mission_id: &str, event: &NewEvent)
        -> Result<EventAck, ClientError>;
}

#[async_trait]
impl Coordinator for CoordinatorClient {
    async fn get_mission(&self, mission_id: &str) -> Result<Mission, ClientError> {
        CoordinatorClient::get_mission(self, mission_id).await
    }

    async fn next_step(
        &self,
        mission_id: &str,
        worker_id: &str,
    ) -> Result<Option<Step>, ClientError> {
        CoordinatorClient::next_step(self, mission_id, worker_id).await
    }

    async fn post_event(
        &self,
        mission_id: &str,
        event: &NewEvent,
    ) -> Result<EventAck, ClientError> {
        CoordinatorClient::post_event(self, mission_id, event).await
    }
}
