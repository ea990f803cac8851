//! Phases 4-7 (spec §4.1): materialize missions and steps from approved
//! proposals, close finished missions, and escalate stuck ones.

use chrono::Utc;
use serde_json::json;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    Event, Mission, MissionStatus, Proposal, ProposalStatus, Step, StepStatus,
};
use crate::domain::ports::hook::{HookContext, HookDecision, HookPoint};
use crate::domain::ports::{
    AgentRepository, BoardClient, EventRepository, MissionFilter, MissionRepository,
    ProposalFilter, ProposalRepository, StepRepository,
};

use super::Orchestrator;

impl Orchestrator {
    /// Phase 4: every APPROVED proposal without a mission yet gets a
    /// PLANNED mission (spec §4.1.4).
    pub(super) async fn materialize_missions(&self) -> DomainResult<u64> {
        let approved = self
            .proposal_repo
            .list(ProposalFilter { project_id: None, status: Some(ProposalStatus::Approved) })
            .await?;

        let mut created = 0u64;
        for proposal in approved {
            if self.mission_repo.get_by_proposal(proposal.id).await?.is_some() {
                continue;
            }
            let mission = build_mission(&proposal);
            self.mission_repo.create(&mission).await?;
            created += 1;
        }
        Ok(created)
    }

    /// Phase 5: every PLANNED mission without steps gets the default
    /// 4-step plan and flips to ACTIVE (spec §4.1.5).
    pub(super) async fn materialize_steps(&self) -> DomainResult<u64> {
        let planned = self
            .mission_repo
            .list(MissionFilter { project_id: None, status: Some(MissionStatus::Planned) })
            .await?;

        let mut created = 0u64;
        for mut mission in planned {
            let existing = self.step_repo.list_by_mission(mission.id).await?;
            if !existing.is_empty() {
                continue;
            }

            let steps = Step::default_plan(mission.id, &mission.title);
            created += steps.len() as u64;
            self.step_repo.create_many(&steps).await?;

            mission.status = MissionStatus::Active;
            self.mission_repo.update(&mission).await?;
        }
        Ok(created)
    }

    /// Phase 6: ACTIVE missions whose steps are all COMPLETED close out
    /// (spec §4.1.6).
    pub(super) async fn close_completed_missions(&self) -> DomainResult<u64> {
        let active = self
            .mission_repo
            .list(MissionFilter { project_id: None, status: Some(MissionStatus::Active) })
            .await?;

        let mut closed = 0u64;
        for mut mission in active {
            let steps = self.step_repo.list_by_mission(mission.id).await?;
            if steps.is_empty() || !steps.iter().all(|s| s.status == StepStatus::Completed) {
                continue;
            }

            mission.status = MissionStatus::Completed;
            mission.completed_at = Some(Utc::now());
            self.mission_repo.update(&mission).await?;

            let event = Event::new(
                "mission.completed",
                mission.project_id,
                json!({ "mission_id": mission.id.to_string() }),
            );
            self.event_repo.append(&event).await?;

            let ctx = HookContext::new().with_entity(mission.project_id, mission.id);
            if let Ok(HookDecision::Block(reason)) = self.hook_bus.fire(HookPoint::OnMissionComplete, &ctx).await {
                tracing::warn!(mission_id = %mission.id, reason = %reason, "on_mission_complete hook blocked (advisory only, mission already closed)");
            }

            self.report_mission_to_board(&mission).await;

            closed += 1;
        }
        Ok(closed)
    }

    /// Phase 7: ACTIVE missions with at least one FAILED step and nothing
    /// left in flight escalate to the board as an ask-user (spec §4.1.7).
    pub(super) async fn escalate_stuck_missions(&self) -> DomainResult<u64> {
        let active = self
            .mission_repo
            .list(MissionFilter { project_id: None, status: Some(MissionStatus::Active) })
            .await?;

        let mut escalated = 0u64;
        for mission in active {
            let steps = self.step_repo.list_by_mission(mission.id).await?;
            let failed_step = steps.iter().find(|s| s.status == StepStatus::Failed);
            let still_in_flight = steps.iter().any(|s| {
                matches!(s.status, StepStatus::Pending | StepStatus::Claimed | StepStatus::Running)
            });
            let Some(failed_step) = failed_step else { continue };
            if still_in_flight {
                continue;
            }

            let ctx = HookContext::new().with_entity(mission.project_id, mission.id);
            if let Ok(HookDecision::Block(reason)) = self.hook_bus.fire(HookPoint::OnStuckCheck, &ctx).await {
                tracing::info!(mission_id = %mission.id, reason = %reason, "on_stuck_check hook suppressed escalation");
                continue;
            }

            if let Some(board) = self.board_client.as_ref() {
                let proposal = self.proposal_repo.get(mission.proposal_id).await?;
                let mc_board_id = proposal.as_ref().and_then(|p| p.mc_board_id.clone());
                if let Some(mc_board_id) = mc_board_id {
                    let content = format!(
                        "Mission '{}' is stuck.\nFailed step: {} ({})\nError: {}\n\nPlease advise: retry, skip, or cancel?",
                        mission.title,
                        failed_step.title,
                        failed_step.step_type.as_str(),
                        failed_step.error.as_deref().unwrap_or("unknown"),
                    );
                    let correlation_id = format!("stuck-mission-{}", mission.id);
                    board.ask_user(&mc_board_id, &content, Some(&correlation_id)).await?;
                }
            }

            let event = Event::new(
                "mission.escalated",
                mission.project_id,
                json!({ "mission_id": mission.id.to_string() }),
            );
            self.event_repo.append(&event).await?;
            escalated += 1;
        }
        Ok(escalated)
    }

    /// Reports mission completion back to the originating board for
    /// board-synced proposals: an activity comment plus a status
    /// transition to "review" (grounded on `_report_mission_to_mc`).
    async fn report_mission_to_board(&self, mission: &Mission) {
        let Some(board) = self.board_client.as_ref() else { return };

        let proposal = match self.proposal_repo.get(mission.proposal_id).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(mission_id = %mission.id, error = %e, "failed to load proposal for board report");
                return;
            }
        };
        let Some(proposal) = proposal else { return };
        let (Some(mc_board_id), Some(mc_task_id)) = (&proposal.mc_board_id, &proposal.mc_task_id) else {
            return;
        };

        let agent_name = match mission.assigned_agent_id {
            Some(agent_id) => self
                .agent_repo
                .get(agent_id)
                .await
                .ok()
                .flatten()
                .map(|a| a.name)
                .unwrap_or_else(|| "AgentLoop".to_string()),
            None => "AgentLoop".to_string(),
        };

        let comment = format!("Mission completed: {}", mission.title);
        if let Err(e) = board.post_comment(mc_board_id, mc_task_id, &comment).await {
            tracing::warn!(mission_id = %mission.id, error = %e, "MC outbound comment failed");
            return;
        }
        let status_comment = format!("Completed by {agent_name} via AgentLoop.");
        if let Err(e) = board.update_task_status(mc_board_id, mc_task_id, "review", Some(&status_comment)).await {
            tracing::warn!(mission_id = %mission.id, error = %e, "MC outbound status update failed");
        }
    }
}

fn build_mission(proposal: &Proposal) -> Mission {
    Mission::new(proposal.id, proposal.project_id, proposal.title.clone(), proposal.description.clone(), None)
}
