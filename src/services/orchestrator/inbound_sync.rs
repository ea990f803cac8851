//! Phase 1: inbound sync (spec §4.1.1) — pulls open tasks from every
//! mapped board and materializes unseen ones as PENDING proposals.

use serde_json::json;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Event, Proposal, ProposalPriority, ProposalStatus};
use crate::domain::ports::hook::{HookContext, HookPoint};
use crate::domain::ports::{AgentRepository, BoardClient, EventRepository, ProjectRepository, ProposalRepository};

use super::Orchestrator;

/// Task states the board considers not-yet-claimed by a human (spec §4.1.1).
const SYNCABLE_STATUSES: [&str; 2] = ["inbox", "in_progress"];

impl Orchestrator {
    pub(super) async fn run_inbound_sync(&self) -> DomainResult<u64> {
        let ctx = HookContext::new();
        let _ = self.hook_bus.fire(HookPoint::OnTickSync, &ctx).await;

        let Some(board) = self.board_client.as_ref() else {
            return Ok(0);
        };

        let mut created = 0u64;

        for mapping in &self.config.board_mappings {
            let Some(project) = self.project_repo.get_by_slug(&mapping.project_slug).await? else {
                tracing::warn!(project_slug = %mapping.project_slug, "board mapping references unknown project, skipping");
                continue;
            };
            if project.status == crate::domain::models::ProjectStatus::Decommissioned {
                continue;
            }

            let mut tasks = Vec::new();
            for status in SYNCABLE_STATUSES {
                tasks.extend(board.list_tasks(&mapping.board_id, Some(status)).await?);
            }

            let Some(agent) = self.agent_repo.first_active_in_project(project.id).await? else {
                tracing::warn!(project = %project.slug, "no active agent to attribute synced proposals to, skipping board");
                continue;
            };

            for task in tasks {
                if self.proposal_repo.get_by_mc_task_id(&task.id).await?.is_some() {
                    continue;
                }

                let priority = ProposalPriority::from_board_value(&task.priority);
                let mut proposal = Proposal::new(
                    agent.id,
                    project.id,
                    task.title.clone(),
                    task.description.clone(),
                    "Synced from board".to_string(),
                    priority,
                );
                proposal.auto_approve = priority.implies_auto_approve();
                proposal.status = ProposalStatus::Pending;
                proposal.mc_task_id = Some(task.id.clone());
                proposal.mc_board_id = Some(mapping.board_id.clone());

                self.proposal_repo.create(&proposal).await?;
                created += 1;

                let event = Event::new(
                    "proposal.synced",
                    project.id,
                    json!({ "proposal_id": proposal.id.to_string(), "mc_task_id": task.id }),
                );
                self.event_repo.append(&event).await?;
            }
        }

        Ok(created)
    }
}
