//! Mission repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Mission, MissionStatus};

#[derive(Debug, Clone, Default)]
pub struct MissionFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<MissionStatus>,
}

#[async_trait]
pub trait MissionRepository: Send + Sync {
    async fn create(&self, mission: &Mission) -> DomainResult<()>;
    async fn get(&self, id: Uuid) -> DomainResult<Option<Mission>>;
    async fn get_by_proposal(&self, proposal_id: Uuid) -> DomainResult<Option<Mission>>;
    async fn update(&self, mission: &Mission) -> DomainResult<()>;
    async fn list(&self, filter: MissionFilter) -> DomainResult<Vec<Mission>>;
}
