//! Phase 8 (spec §4.1.8): prune old events and expire stale PENDING
//! proposals.

use chrono::Utc;

use crate::domain::errors::DomainResult;
use crate::domain::models::ProposalStatus;
use crate::domain::ports::{EventRepository, ProposalRepository};

use super::Orchestrator;

impl Orchestrator {
    pub(super) async fn run_retention(&self) -> DomainResult<(u64, u64)> {
        let event_cutoff = Utc::now() - self.config.event_retention;
        let events_deleted = self.event_repo.delete_older_than(event_cutoff).await?;

        let proposal_cutoff = Utc::now() - self.config.proposal_expiry;
        let stale = self.proposal_repo.list_pending_before(proposal_cutoff).await?;

        let mut expired = 0u64;
        for mut proposal in stale {
            proposal.status = ProposalStatus::Expired;
            self.proposal_repo.update(&proposal).await?;
            expired += 1;
        }

        Ok((events_deleted, expired))
    }
}
