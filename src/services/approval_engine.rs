//! ApprovalEngine — decides PENDING -> APPROVED/REJECTED under a composable
//! policy (spec §4.2).

use std::sync::Arc;

use chrono::Utc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Proposal, ProposalPriority, ProposalStatus};
use crate::domain::ports::{ProposalFilter, ProposalRepository};

/// Keyword classes checked in order after the `auto_approve_proposals`
/// agent-config rule (spec §4.2 rules 2-4). First match wins.
const FIX_KEYWORDS: &[&str] = &["fix", "patch", "hotfix", "typo"];
const DOCS_KEYWORDS: &[&str] = &["docs", "documentation", "readme"];
const TEST_KEYWORDS: &[&str] = &["test", "spec", "testing"];

fn title_contains_any(title: &str, keywords: &[&str]) -> bool {
    let lower = title.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Whether `proposal` should be auto-approved, given the originating
/// agent's `auto_approve_proposals` config flag. All four rules require
/// `proposal.auto_approve == true` as a precondition (spec §9 open
/// question: "kept as-is").
#[must_use]
pub fn should_auto_approve(proposal: &Proposal, agent_auto_approve_proposals: bool) -> bool {
    if !proposal.auto_approve {
        return false;
    }

    let low_or_medium = matches!(proposal.priority, ProposalPriority::Low | ProposalPriority::Medium);
    if low_or_medium && agent_auto_approve_proposals {
        return true;
    }

    title_contains_any(&proposal.title, FIX_KEYWORDS)
        || title_contains_any(&proposal.title, DOCS_KEYWORDS)
        || title_contains_any(&proposal.title, TEST_KEYWORDS)
}

/// Transitions PENDING proposals to APPROVED or leaves them PENDING for
/// manual review (spec §4.2).
pub struct ApprovalEngine<P, A>
where
    P: ProposalRepository + 'static,
    A: crate::domain::ports::AgentRepository + 'static,
{
    proposal_repo: Arc<P>,
    agent_repo: Arc<A>,
}

impl<P, A> ApprovalEngine<P, A>
where
    P: ProposalRepository + 'static,
    A: crate::domain::ports::AgentRepository + 'static,
{
    pub fn new(proposal_repo: Arc<P>, agent_repo: Arc<A>) -> Self {
        Self { proposal_repo, agent_repo }
    }

    /// Process every PENDING proposal in `project_id`, auto-approving the
    /// ones that match the policy. Returns the number approved this pass.
    pub async fn process_pending(&self, project_id: uuid::Uuid) -> DomainResult<u32> {
        let pending = self
            .proposal_repo
            .list(ProposalFilter { project_id: Some(project_id), status: Some(ProposalStatus::Pending) })
            .await?;

        let mut approved = 0u32;
        for mut proposal in pending {
            let agent = self.agent_repo.get(proposal.agent_id).await?;
            let agent_auto_approve = agent.map(|a| a.config.auto_approve_proposals).unwrap_or(false);

            if should_auto_approve(&proposal, agent_auto_approve) {
                proposal.status = ProposalStatus::Approved;
                proposal.reviewed_by = Some("system".to_string());
                proposal.reviewed_at = Some(Utc::now());
                self.proposal_repo.update(&proposal).await?;
                approved += 1;
                tracing::info!(proposal_id = %proposal.id, title = %proposal.title, "auto-approved proposal");
            }
        }

        Ok(approved)
    }

    /// Manually approve a PENDING proposal. Fails on non-PENDING proposals
    /// without mutating state (spec §4.2 "Manual transitions").
    pub async fn approve(&self, proposal_id: uuid::Uuid, reviewer: &str) -> DomainResult<Proposal> {
        let mut proposal = self
            .proposal_repo
            .get(proposal_id)
            .await?
            .ok_or(DomainError::ProposalNotFound(proposal_id))?;

        if proposal.status != ProposalStatus::Pending {
            return Err(DomainError::Conflict {
                entity: "proposal",
                id: proposal_id,
                reason: "not pending",
            });
        }

        proposal.status = ProposalStatus::Approved;
        proposal.reviewed_by = Some(reviewer.to_string());
        proposal.reviewed_at = Some(Utc::now());
        self.proposal_repo.update(&proposal).await?;
        Ok(proposal)
    }

    /// Manually reject a PENDING proposal, appending a human-readable
    /// rejection line to its rationale.
    pub async fn reject(&self, proposal_id: uuid::Uuid, reviewer: &str, reason: &str) -> DomainResult<Proposal> {
        let mut proposal = self
            .proposal_repo
            .get(proposal_id)
            .await?
            .ok_or(DomainError::ProposalNotFound(proposal_id))?;

        if proposal.status != ProposalStatus::Pending {
            return Err(DomainError::Conflict {
                entity: "proposal",
                id: proposal_id,
                reason: "not pending",
            });
        }

        proposal.status = ProposalStatus::Rejected;
        proposal.reviewed_by = Some(reviewer.to_string());
        proposal.reviewed_at = Some(Utc::now());
        proposal.rationale = format!("{}\n\nRejected by {reviewer}: {reason}", proposal.rationale);
        self.proposal_repo.update(&proposal).await?;
        Ok(proposal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Proposal;
    use uuid::Uuid;

    fn pending_proposal(title: &str, priority: ProposalPriority, auto_approve: bool) -> Proposal {
        let mut p = Proposal::new(Uuid::now_v7(), Uuid::now_v7(), title, "desc", "why", priority);
        p.auto_approve = auto_approve;
        p
    }

    #[test]
    fn keyword_rule_fires_regardless_of_agent_flag() {
        let p = pending_proposal("Fix typo in README", ProposalPriority::High, true);
        assert!(should_auto_approve(&p, false));
    }

    #[test]
    fn agent_flag_rule_requires_low_or_medium_priority() {
        let p = pending_proposal("Implement new search index", ProposalPriority::Medium, true);
        assert!(should_auto_approve(&p, true));

        let p_high = pending_proposal("Implement new search index", ProposalPriority::High, true);
        assert!(!should_auto_approve(&p_high, true));
    }

    #[test]
    fn requires_auto_approve_flag_on_proposal() {
        let p = pending_proposal("Fix typo in README", ProposalPriority::Critical, false);
        assert!(!should_auto_approve(&p, true));
    }

    #[test]
    fn docs_and_test_keyword_classes_match() {
        let docs = pending_proposal("Update README documentation", ProposalPriority::High, true);
        assert!(should_auto_approve(&docs, false));

        let tests = pending_proposal("Add integration test for billing", ProposalPriority::High, true);
        assert!(should_auto_approve(&tests, false));
    }

    #[test]
    fn no_rule_matches_leaves_proposal_unapproved() {
        let p = pending_proposal("Add dark mode toggle", ProposalPriority::High, true);
        assert!(!should_auto_approve(&p, false));
    }
}
