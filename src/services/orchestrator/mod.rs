//! Orchestrator — the tick engine sequencing one pass of the work pipeline
//! (spec §4.1).
//!
//! Phases run in strict order and share one logical pass; each phase is
//! wrapped so a failure is recorded into `OrchestrationResult.errors`
//! rather than aborting the remaining phases (spec §4.1 "Failure
//! semantics").

mod inbound_sync;
mod mission_pipeline;
mod retention;

use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::Mutex;

use crate::domain::errors::DomainResult;
use crate::domain::ports::{
    AgentRepository, BoardClient, EventRepository, HookBus, MissionRepository, ProjectRepository,
    ProposalRepository, StepRepository, TriggerRepository,
};
use crate::services::approval_engine::ApprovalEngine;
use crate::services::trigger_evaluator::TriggerEvaluator;

/// Maps an external board id to the project slug it syncs into (spec §6
/// `board_map`).
#[derive(Debug, Clone)]
pub struct BoardMapping {
    pub board_id: String,
    pub project_slug: String,
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub board_mappings: Vec<BoardMapping>,
    pub trigger_window: ChronoDuration,
    pub event_retention: ChronoDuration,
    pub proposal_expiry: ChronoDuration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            board_mappings: Vec::new(),
            trigger_window: ChronoDuration::minutes(5),
            event_retention: ChronoDuration::days(30),
            proposal_expiry: ChronoDuration::days(7),
        }
    }
}

/// Counters returned by every tick (spec §4.1 "Failure semantics").
#[derive(Debug, Clone, Default)]
pub struct OrchestrationResult {
    pub proposals_created: u64,
    pub proposals_approved: u64,
    pub triggers_evaluated: u64,
    pub triggers_fired: u64,
    pub events_processed: u64,
    pub missions_created: u64,
    pub steps_created: u64,
    pub missions_closed: u64,
    pub missions_escalated: u64,
    pub events_retained_deleted: u64,
    pub proposals_expired: u64,
    pub duration_ms: u64,
    pub errors: Vec<String>,
}

/// Sequences one tick across every repository port and the board client.
/// Repositories are held as trait objects: the orchestrator composes many
/// independent ports and a generic-per-repository signature would balloon
/// without adding type safety the trait objects don't already provide.
pub struct Orchestrator {
    pub(super) project_repo: Arc<dyn ProjectRepository>,
    pub(super) agent_repo: Arc<dyn AgentRepository>,
    pub(super) proposal_repo: Arc<dyn ProposalRepository>,
    pub(super) mission_repo: Arc<dyn MissionRepository>,
    pub(super) step_repo: Arc<dyn StepRepository>,
    pub(super) event_repo: Arc<dyn EventRepository>,
    pub(super) trigger_repo: Arc<dyn TriggerRepository>,
    pub(super) board_client: Option<Arc<dyn BoardClient>>,
    pub(super) hook_bus: Arc<dyn HookBus>,
    pub(super) config: OrchestratorConfig,
    tick_guard: Mutex<()>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        project_repo: Arc<dyn ProjectRepository>,
        agent_repo: Arc<dyn AgentRepository>,
        proposal_repo: Arc<dyn ProposalRepository>,
        mission_repo: Arc<dyn MissionRepository>,
        step_repo: Arc<dyn StepRepository>,
        event_repo: Arc<dyn EventRepository>,
        trigger_repo: Arc<dyn TriggerRepository>,
        hook_bus: Arc<dyn HookBus>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            project_repo,
            agent_repo,
            proposal_repo,
            mission_repo,
            step_repo,
            event_repo,
            trigger_repo,
            board_client: None,
            hook_bus,
            config,
            tick_guard: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn with_board_client(mut self, board_client: Arc<dyn BoardClient>) -> Self {
        self.board_client = Some(board_client);
        self
    }

    /// Runs exactly one tick. Serialized against concurrent calls on the
    /// same instance via an internal guard (spec §5 "Scheduling model").
    pub async fn tick(&self) -> OrchestrationResult {
        let _guard = self.tick_guard.lock().await;
        let start = Instant::now();
        let mut result = OrchestrationResult::default();

        // Phase 1: inbound sync.
        match self.run_inbound_sync().await {
            Ok(created) => result.proposals_created = created,
            Err(e) => result.errors.push(format!("inbound_sync: {e}")),
        }

        // Phase 2: approvals.
        match self.run_approvals().await {
            Ok(approved) => result.proposals_approved = approved,
            Err(e) => result.errors.push(format!("approvals: {e}")),
        }

        // Phase 3: trigger evaluation.
        match self.run_trigger_evaluation().await {
            Ok(summary) => {
                result.triggers_evaluated = summary.triggers_evaluated;
                result.triggers_fired = summary.triggers_fired;
                result.events_processed = summary.events_processed;
            }
            Err(e) => result.errors.push(format!("trigger_evaluation: {e}")),
        }

        // Phase 4 + 5: materialize missions and steps.
        match self.materialize_missions().await {
            Ok(created) => result.missions_created = created,
            Err(e) => result.errors.push(format!("materialize_missions: {e}")),
        }
        match self.materialize_steps().await {
            Ok(created) => result.steps_created = created,
            Err(e) => result.errors.push(format!("materialize_steps: {e}")),
        }

        // Phase 6: close completed missions.
        match self.close_completed_missions().await {
            Ok(closed) => result.missions_closed = closed,
            Err(e) => result.errors.push(format!("close_missions: {e}")),
        }

        // Phase 7: escalate stuck missions.
        match self.escalate_stuck_missions().await {
            Ok(escalated) => result.missions_escalated = escalated,
            Err(e) => result.errors.push(format!("escalate: {e}")),
        }

        // Phase 8: retention.
        match self.run_retention().await {
            Ok((events_deleted, proposals_expired)) => {
                result.events_retained_deleted = events_deleted;
                result.proposals_expired = proposals_expired;
            }
            Err(e) => result.errors.push(format!("retention: {e}")),
        }

        result.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        result
    }

    async fn run_approvals(&self) -> DomainResult<u64> {
        let mut total = 0u64;
        for project in self.project_repo.list(Default::default()).await? {
            let engine = ApprovalEngine::new(
                Arc::new(ProposalRepoProxy(self.proposal_repo.clone())),
                Arc::new(AgentRepoProxy(self.agent_repo.clone())),
            );
            total += u64::from(engine.process_pending(project.id).await?);
        }
        Ok(total)
    }

    async fn run_trigger_evaluation(&self) -> DomainResult<crate::services::trigger_evaluator::TriggerEvalSummary> {
        let evaluator = TriggerEvaluator::new(
            Arc::new(TriggerRepoProxy(self.trigger_repo.clone())),
            Arc::new(EventRepoProxy(self.event_repo.clone())),
            Arc::new(MissionRepoProxy(self.mission_repo.clone())),
            Arc::new(StepRepoProxy(self.step_repo.clone())),
        );
        let since = Utc::now() - self.config.trigger_window;

        let mut summary = crate::services::trigger_evaluator::TriggerEvalSummary::default();
        for project in self.project_repo.list(Default::default()).await? {
            let per_project = evaluator.evaluate(project.id, since).await?;
            summary.triggers_evaluated += per_project.triggers_evaluated;
            summary.triggers_fired += per_project.triggers_fired;
            summary.events_processed += per_project.events_processed;
        }
        Ok(summary)
    }
}

/// Thin newtype wrappers so the concrete-generic `ApprovalEngine`/
/// `TriggerEvaluator` services (built against `T: Trait` bounds for
/// testability in isolation) can be driven by the orchestrator's
/// trait-object repositories without a second repository implementation.
pub(super) struct ProposalRepoProxy(pub(super) Arc<dyn ProposalRepository>);
pub(super) struct AgentRepoProxy(pub(super) Arc<dyn AgentRepository>);
pub(super) struct MissionRepoProxy(pub(super) Arc<dyn MissionRepository>);
pub(super) struct StepRepoProxy(pub(super) Arc<dyn StepRepository>);
pub(super) struct EventRepoProxy(pub(super) Arc<dyn EventRepository>);
pub(super) struct TriggerRepoProxy(pub(super) Arc<dyn TriggerRepository>);

#[async_trait::async_trait]
impl ProposalRepository for ProposalRepoProxy {
    async fn create(&self, proposal: &crate::domain::models::Proposal) -> DomainResult<()> {
        self.0.create(proposal).await
    }
    async fn get(&self, id: uuid::Uuid) -> DomainResult<Option<crate::domain::models::Proposal>> {
        self.0.get(id).await
    }
    async fn get_by_mc_task_id(&self, mc_task_id: &str) -> DomainResult<Option<crate::domain::models::Proposal>> {
        self.0.get_by_mc_task_id(mc_task_id).await
    }
    async fn update(&self, proposal: &crate::domain::models::Proposal) -> DomainResult<()> {
        self.0.update(proposal).await
    }
    async fn list(&self, filter: crate::domain::ports::ProposalFilter) -> DomainResult<Vec<crate::domain::models::Proposal>> {
        self.0.list(filter).await
    }
    async fn list_pending_before(&self, cutoff: chrono::DateTime<Utc>) -> DomainResult<Vec<crate::domain::models::Proposal>> {
        self.0.list_pending_before(cutoff).await
    }
}

#[async_trait::async_trait]
impl AgentRepository for AgentRepoProxy {
    async fn create(&self, agent: &crate::domain::models::Agent) -> DomainResult<()> {
        self.0.create(agent).await
    }
    async fn get(&self, id: uuid::Uuid) -> DomainResult<Option<crate::domain::models::Agent>> {
        self.0.get(id).await
    }
    async fn update(&self, agent: &crate::domain::models::Agent) -> DomainResult<()> {
        self.0.update(agent).await
    }
    async fn list(&self, filter: crate::domain::ports::AgentFilter) -> DomainResult<Vec<crate::domain::models::Agent>> {
        self.0.list(filter).await
    }
    async fn first_active_in_project(&self, project_id: uuid::Uuid) -> DomainResult<Option<crate::domain::models::Agent>> {
        self.0.first_active_in_project(project_id).await
    }
}

#[async_trait::async_trait]
impl MissionRepository for MissionRepoProxy {
    async fn create(&self, mission: &crate::domain::models::Mission) -> DomainResult<()> {
        self.0.create(mission).await
    }
    async fn get(&self, id: uuid::Uuid) -> DomainResult<Option<crate::domain::models::Mission>> {
        self.0.get(id).await
    }
    async fn get_by_proposal(&self, proposal_id: uuid::Uuid) -> DomainResult<Option<crate::domain::models::Mission>> {
        self.0.get_by_proposal(proposal_id).await
    }
    async fn update(&self, mission: &crate::domain::models::Mission) -> DomainResult<()> {
        self.0.update(mission).await
    }
    async fn list(&self, filter: crate::domain::ports::MissionFilter) -> DomainResult<Vec<crate::domain::models::Mission>> {
        self.0.list(filter).await
    }
}

#[async_trait::async_trait]
impl StepRepository for StepRepoProxy {
    async fn create(&self, step: &crate::domain::models::Step) -> DomainResult<()> {
        self.0.create(step).await
    }
    async fn create_many(&self, steps: &[crate::domain::models::Step]) -> DomainResult<()> {
        self.0.create_many(steps).await
    }
    async fn get(&self, id: uuid::Uuid) -> DomainResult<Option<crate::domain::models::Step>> {
        self.0.get(id).await
    }
    async fn update(&self, step: &crate::domain::models::Step) -> DomainResult<()> {
        self.0.update(step).await
    }
    async fn list(&self, filter: crate::domain::ports::StepFilter) -> DomainResult<Vec<crate::domain::models::Step>> {
        self.0.list(filter).await
    }
    async fn list_by_mission(&self, mission_id: uuid::Uuid) -> DomainResult<Vec<crate::domain::models::Step>> {
        self.0.list_by_mission(mission_id).await
    }
    async fn list_selectable_for_agent(&self, project_id: uuid::Uuid, agent_id: uuid::Uuid) -> DomainResult<Vec<crate::domain::models::Step>> {
        self.0.list_selectable_for_agent(project_id, agent_id).await
    }
}

#[async_trait::async_trait]
impl EventRepository for EventRepoProxy {
    async fn append(&self, event: &crate::domain::models::Event) -> DomainResult<()> {
        self.0.append(event).await
    }
    async fn list_since(&self, project_id: uuid::Uuid, since: chrono::DateTime<Utc>) -> DomainResult<Vec<crate::domain::models::Event>> {
        self.0.list_since(project_id, since).await
    }
    async fn delete_older_than(&self, cutoff: chrono::DateTime<Utc>) -> DomainResult<u64> {
        self.0.delete_older_than(cutoff).await
    }
}

#[async_trait::async_trait]
impl TriggerRepository for TriggerRepoProxy {
    async fn create(&self, trigger: &crate::domain::models::Trigger) -> DomainResult<()> {
        self.0.create(trigger).await
    }
    async fn get(&self, id: uuid::Uuid) -> DomainResult<Option<crate::domain::models::Trigger>> {
        self.0.get(id).await
    }
    async fn get_by_name(&self, project_id: uuid::Uuid, name: &str) -> DomainResult<Option<crate::domain::models::Trigger>> {
        self.0.get_by_name(project_id, name).await
    }
    async fn update(&self, trigger: &crate::domain::models::Trigger) -> DomainResult<()> {
        self.0.update(trigger).await
    }
    async fn delete(&self, id: uuid::Uuid) -> DomainResult<()> {
        self.0.delete(id).await
    }
    async fn list(&self, project_id: uuid::Uuid) -> DomainResult<Vec<crate::domain::models::Trigger>> {
        self.0.list(project_id).await
    }
    async fn list_enabled(&self) -> DomainResult<Vec<crate::domain::models::Trigger>> {
        self.0.list_enabled().await
    }
}
