//! Proposal repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Proposal, ProposalStatus};

#[derive(Debug, Clone, Default)]
pub struct ProposalFilter {
    pub project_id: Option<Uuid>,
    pub status: Option<ProposalStatus>,
}

#[async_trait]
pub trait ProposalRepository: Send + Sync {
    async fn create(&self, proposal: &Proposal) -> DomainResult<()>;
    async fn get(&self, id: Uuid) -> DomainResult<Option<Proposal>>;
    async fn get_by_mc_task_id(&self, mc_task_id: &str) -> DomainResult<Option<Proposal>>;
    async fn update(&self, proposal: &Proposal) -> DomainResult<()>;
    async fn list(&self, filter: ProposalFilter) -> DomainResult<Vec<Proposal>>;

    /// Pending proposals created before `cutoff` (retention phase, spec §4.1.8).
    async fn list_pending_before(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<Proposal>>;
}
