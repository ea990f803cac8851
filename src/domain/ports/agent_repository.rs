//! Agent repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Agent, AgentStatus};

#[derive(Debug, Clone, Default)]
pub struct AgentFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<AgentStatus>,
}

#[async_trait]
pub trait AgentRepository: Send + Sync {
    async fn create(&self, agent: &Agent) -> DomainResult<()>;
    async fn get(&self, id: Uuid) -> DomainResult<Option<Agent>>;
    async fn update(&self, agent: &Agent) -> DomainResult<()>;
    async fn list(&self, filter: AgentFilter) -> DomainResult<Vec<Agent>>;

    /// First ACTIVE agent in a project by creation order — the
    /// deterministic reading of "first active agent" used by inbound
    /// sync (spec §9 open question).
    async fn first_active_in_project(&self, project_id: Uuid) -> DomainResult<Option<Agent>>;
}
