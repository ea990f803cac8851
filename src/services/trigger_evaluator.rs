//! TriggerEvaluator — matches recent events against trigger patterns and
//! executes trigger actions transactionally (spec §4.3).

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Event, Mission, MissionStatus, Step, StepStatus, TriggerAction};
use crate::domain::ports::{EventRepository, MissionRepository, StepFilter, StepRepository, TriggerRepository};

/// Outcome of one evaluation pass, folded into `OrchestrationResult`.
#[derive(Debug, Clone, Default)]
pub struct TriggerEvalSummary {
    pub triggers_evaluated: u64,
    pub triggers_fired: u64,
    pub events_processed: u64,
}

pub struct TriggerEvaluator<TR, EV, MI, ST>
where
    TR: TriggerRepository + 'static,
    EV: EventRepository + 'static,
    MI: MissionRepository + 'static,
    ST: StepRepository + 'static,
{
    trigger_repo: Arc<TR>,
    event_repo: Arc<EV>,
    mission_repo: Arc<MI>,
    step_repo: Arc<ST>,
}

impl<TR, EV, MI, ST> TriggerEvaluator<TR, EV, MI, ST>
where
    TR: TriggerRepository + 'static,
    EV: EventRepository + 'static,
    MI: MissionRepository + 'static,
    ST: StepRepository + 'static,
{
    pub fn new(trigger_repo: Arc<TR>, event_repo: Arc<EV>, mission_repo: Arc<MI>, step_repo: Arc<ST>) -> Self {
        Self { trigger_repo, event_repo, mission_repo, step_repo }
    }

    /// Evaluates every enabled trigger (in creation order) against events
    /// since `since` for `project_id`, firing matching actions. Each
    /// `(trigger, event)` pair is evaluated at most once (spec §4.3
    /// "Ordering and tie-breaks").
    pub async fn evaluate(&self, project_id: Uuid, since: chrono::DateTime<Utc>) -> DomainResult<TriggerEvalSummary> {
        let mut summary = TriggerEvalSummary::default();

        let events = self.event_repo.list_since(project_id, since).await?;
        summary.events_processed = events.len() as u64;

        let triggers = self
            .trigger_repo
            .list_enabled()
            .await?
            .into_iter()
            .filter(|t| t.project_id == project_id)
            .collect::<Vec<_>>();

        for mut trigger in triggers {
            for event in &events {
                summary.triggers_evaluated += 1;

                if !trigger.event_pattern.matches(&event.event_type, &event.payload) {
                    continue;
                }

                let fired = match &trigger.action {
                    TriggerAction::CreateStep { .. } => self.execute_create_step(&trigger.action, event).await?,
                    TriggerAction::EvaluateMissionCompletion => {
                        self.execute_evaluate_mission_completion(event).await?
                    }
                };

                if fired {
                    summary.triggers_fired += 1;
                    trigger.last_fired_at = Some(Utc::now());
                    self.trigger_repo.update(&trigger).await?;
                    tracing::info!(trigger = %trigger.name, event_type = %event.event_type, "trigger fired");
                }
            }
        }

        Ok(summary)
    }

    /// `CreateStep`: no-op if `mission_id` missing from the event payload
    /// (spec §4.3 "Actions").
    async fn execute_create_step(&self, action: &TriggerAction, event: &Event) -> DomainResult<bool> {
        let TriggerAction::CreateStep { title, description, order_index, .. } = action else {
            return Ok(false);
        };

        let Some(mission_id) = event.payload_str("mission_id").and_then(|s| Uuid::parse_str(s).ok()) else {
            return Ok(false);
        };

        let step = Step::new(
            mission_id,
            order_index.unwrap_or(999),
            title.clone().unwrap_or_else(|| "Triggered step".to_string()),
            description.clone().unwrap_or_default(),
            action.step_type_or_default(),
        );
        self.step_repo.create(&step).await?;
        Ok(true)
    }

    /// Re-reads the mission's current status before mutating it so a
    /// mission already closed earlier in this window is a no-op
    /// (spec §9 "idempotent closure" decision).
    async fn execute_evaluate_mission_completion(&self, event: &Event) -> DomainResult<bool> {
        let Some(mission_id) = event.payload_str("mission_id").and_then(|s| Uuid::parse_str(s).ok()) else {
            return Ok(false);
        };

        let Some(mission) = self.mission_repo.get(mission_id).await? else {
            return Ok(false);
        };

        if mission.status != MissionStatus::Active {
            return Ok(false);
        }

        let steps = self.step_repo.list_by_mission(mission_id).await?;
        if steps.is_empty() || !steps.iter().all(|s| s.status == StepStatus::Completed) {
            return Ok(false);
        }

        self.close_mission(mission).await?;
        Ok(true)
    }

    async fn close_mission(&self, mut mission: Mission) -> DomainResult<()> {
        mission.status = MissionStatus::Completed;
        mission.completed_at = Some(Utc::now());
        self.mission_repo.update(&mission).await?;

        let event = Event::new(
            "mission.completed",
            mission.project_id,
            json!({ "mission_id": mission.id.to_string() }),
        );
        self.event_repo.append(&event).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{
        create_migrated_test_pool, SqliteEventRepository, SqliteMissionRepository,
        SqliteStepRepository, SqliteTriggerRepository,
    };
    use crate::domain::models::{EventPattern, Mission, Proposal, ProposalPriority, Trigger, TriggerAction};
    use crate::domain::ports::{AgentRepository, ProjectRepository, ProposalRepository};

    type Evaluator =
        TriggerEvaluator<SqliteTriggerRepository, SqliteEventRepository, SqliteMissionRepository, SqliteStepRepository>;

    async fn build(pool: &sqlx::SqlitePool) -> (Evaluator, Uuid) {
        let project_repo = crate::adapters::sqlite::SqliteProjectRepository::new(pool.clone());
        let project = crate::domain::models::Project::new("p", "p-slug", "d");
        project_repo.create(&project).await.expect("create project");

        let evaluator = TriggerEvaluator::new(
            Arc::new(SqliteTriggerRepository::new(pool.clone())),
            Arc::new(SqliteEventRepository::new(pool.clone())),
            Arc::new(SqliteMissionRepository::new(pool.clone())),
            Arc::new(SqliteStepRepository::new(pool.clone())),
        );
        (evaluator, project.id)
    }

    async fn seed_proposal(pool: &sqlx::SqlitePool, project_id: Uuid) -> Proposal {
        let agent_repo = crate::adapters::sqlite::SqliteAgentRepository::new(pool.clone());
        let agent = crate::domain::models::Agent::new("a", "role", project_id);
        agent_repo.create(&agent).await.expect("create agent");

        let proposal = Proposal::new(agent.id, project_id, "t", "d", "r", ProposalPriority::Medium);
        crate::adapters::sqlite::SqliteProposalRepository::new(pool.clone())
            .create(&proposal)
            .await
            .expect("create proposal");
        proposal
    }

    #[tokio::test]
    async fn create_step_trigger_fires_once_per_matching_event() {
        let pool = create_migrated_test_pool().await.expect("migrated pool");
        let (evaluator, project_id) = build(&pool).await;

        let proposal = seed_proposal(&pool, project_id).await;
        let mission = Mission::new(proposal.id, project_id, "m", "d", None);
        evaluator.mission_repo.create(&mission).await.expect("create mission");

        let trigger = Trigger::new(
            project_id,
            "on-research-done",
            EventPattern { event_type: "step.completed".to_string(), conditions: Default::default() },
            TriggerAction::CreateStep {
                title: Some("Follow-up".to_string()),
                description: Some("auto-created".to_string()),
                step_type: None,
                order_index: Some(5),
            },
        );
        evaluator.trigger_repo.create(&trigger).await.expect("create trigger");

        let since = Utc::now() - chrono::Duration::seconds(5);
        let event = Event::new(
            "step.completed",
            project_id,
            json!({ "mission_id": mission.id.to_string() }),
        );
        evaluator.event_repo.append(&event).await.expect("append event");

        let summary = evaluator.evaluate(project_id, since).await.expect("evaluate");
        assert_eq!(summary.events_processed, 1);
        assert_eq!(summary.triggers_fired, 1);

        let steps = evaluator.step_repo.list_by_mission(mission.id).await.expect("list steps");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].title, "Follow-up");
    }

    #[tokio::test]
    async fn non_matching_event_type_never_fires() {
        let pool = create_migrated_test_pool().await.expect("migrated pool");
        let (evaluator, project_id) = build(&pool).await;

        let trigger = Trigger::new(
            project_id,
            "on-research-done",
            EventPattern { event_type: "step.completed".to_string(), conditions: Default::default() },
            TriggerAction::EvaluateMissionCompletion,
        );
        evaluator.trigger_repo.create(&trigger).await.expect("create trigger");

        let since = Utc::now() - chrono::Duration::seconds(5);
        let event = Event::new("proposal.synced", project_id, json!({}));
        evaluator.event_repo.append(&event).await.expect("append event");

        let summary = evaluator.evaluate(project_id, since).await.expect("evaluate");
        assert_eq!(summary.triggers_evaluated, 1);
        assert_eq!(summary.triggers_fired, 0);
    }

    #[tokio::test]
    async fn each_trigger_event_pair_is_evaluated_at_most_once_per_call() {
        let pool = create_migrated_test_pool().await.expect("migrated pool");
        let (evaluator, project_id) = build(&pool).await;

        let trigger_a = Trigger::new(
            project_id,
            "trigger-a",
            EventPattern { event_type: "step.completed".to_string(), conditions: Default::default() },
            TriggerAction::EvaluateMissionCompletion,
        );
        let trigger_b = Trigger::new(
            project_id,
            "trigger-b",
            EventPattern { event_type: "step.completed".to_string(), conditions: Default::default() },
            TriggerAction::EvaluateMissionCompletion,
        );
        evaluator.trigger_repo.create(&trigger_a).await.expect("create trigger a");
        evaluator.trigger_repo.create(&trigger_b).await.expect("create trigger b");

        let since = Utc::now() - chrono::Duration::seconds(5);
        let event_one = Event::new("step.completed", project_id, json!({}));
        let event_two = Event::new("step.completed", project_id, json!({}));
        evaluator.event_repo.append(&event_one).await.expect("append event one");
        evaluator.event_repo.append(&event_two).await.expect("append event two");

        let summary = evaluator.evaluate(project_id, since).await.expect("evaluate");
        // 2 triggers * 2 events = 4 (trigger, event) pairs, each considered once.
        assert_eq!(summary.triggers_evaluated, 4);
        assert_eq!(summary.events_processed, 2);
    }

    #[tokio::test]
    async fn mission_completion_trigger_closes_mission_once_all_steps_done() {
        let pool = create_migrated_test_pool().await.expect("migrated pool");
        let (evaluator, project_id) = build(&pool).await;

        let proposal = seed_proposal(&pool, project_id).await;
        let mut mission = Mission::new(proposal.id, project_id, "m", "d", None);
        mission.status = MissionStatus::Active;
        evaluator.mission_repo.create(&mission).await.expect("create mission");

        let mut step = Step::new(mission.id, 0, "only step", "d", crate::domain::models::StepType::Code);
        step.status = StepStatus::Completed;
        evaluator.step_repo.create(&step).await.expect("create step");

        let trigger = Trigger::new(
            project_id,
            "on-step-completed",
            EventPattern { event_type: "step.completed".to_string(), conditions: Default::default() },
            TriggerAction::EvaluateMissionCompletion,
        );
        evaluator.trigger_repo.create(&trigger).await.expect("create trigger");

        let since = Utc::now() - chrono::Duration::seconds(5);
        let event = Event::new(
            "step.completed",
            project_id,
            json!({ "mission_id": mission.id.to_string() }),
        );
        evaluator.event_repo.append(&event).await.expect("append event");

        let summary = evaluator.evaluate(project_id, since).await.expect("evaluate");
        assert_eq!(summary.triggers_fired, 1);

        let closed = evaluator.mission_repo.get(mission.id).await.expect("get mission").expect("exists");
        assert_eq!(closed.status, MissionStatus::Completed);
    }
}
