//! Step repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Step, StepStatus};

#[derive(Debug, Clone, Default)]
pub struct StepFilter {
    pub mission_id: Option<Uuid>,
    pub status: Option<StepStatus>,
}

#[async_trait]
pub trait StepRepository: Send + Sync {
    async fn create(&self, step: &Step) -> DomainResult<()>;
    async fn create_many(&self, steps: &[Step]) -> DomainResult<()>;
    async fn get(&self, id: Uuid) -> DomainResult<Option<Step>>;
    async fn update(&self, step: &Step) -> DomainResult<()>;
    async fn list(&self, filter: StepFilter) -> DomainResult<Vec<Step>>;
    async fn list_by_mission(&self, mission_id: Uuid) -> DomainResult<Vec<Step>>;

    /// Steps an agent may select: project-scoped, status in
    /// {PENDING, CLAIMED}, unclaimed or claimed by this agent, ordered by
    /// `order_index` then `created_at` (spec §4.4 Selection).
    async fn list_selectable_for_agent(
        &self,
        project_id: Uuid,
        agent_id: Uuid,
    ) -> DomainResult<Vec<Step>>;
}
