//! End-to-end pipeline coverage: a proposal created directly in the store
//! flows through approval, mission/step materialization, and closure
//! across successive `Orchestrator::tick()` calls (spec §8 scenarios 1-3).

use std::sync::Arc;

use agentloop::adapters::sqlite::{
    create_migrated_test_pool, SqliteAgentRepository, SqliteEventRepository,
    SqliteMissionRepository, SqliteProjectRepository, SqliteProposalRepository,
    SqliteStepRepository, SqliteTriggerRepository,
};
use agentloop::domain::models::{Agent, MissionStatus, Project, Proposal, ProposalPriority, StepStatus};
use agentloop::domain::ports::{
    AgentRepository, MissionFilter, MissionRepository, ProjectRepository, ProposalRepository,
    StepRepository,
};
use agentloop::services::{InMemoryHookBus, Orchestrator, OrchestratorConfig};

async fn seed_project_and_agent(
    project_repo: &SqliteProjectRepository,
    agent_repo: &SqliteAgentRepository,
) -> (Project, Agent) {
    let project = Project::new("Checkout revamp", "checkout", "Rebuild the checkout flow");
    project_repo.create(&project).await.expect("create project");

    let mut agent = Agent::new("worker-1", "generalist", project.id);
    agent.config.capabilities = vec!["general_work".to_string()];
    agent.config.auto_approve_proposals = true;
    agent_repo.create(&agent).await.expect("create agent");

    (project, agent)
}

fn build_orchestrator(pool: &sqlx::SqlitePool) -> Orchestrator {
    Orchestrator::new(
        Arc::new(SqliteProjectRepository::new(pool.clone())),
        Arc::new(SqliteAgentRepository::new(pool.clone())),
        Arc::new(SqliteProposalRepository::new(pool.clone())),
        Arc::new(SqliteMissionRepository::new(pool.clone())),
        Arc::new(SqliteStepRepository::new(pool.clone())),
        Arc::new(SqliteEventRepository::new(pool.clone())),
        Arc::new(SqliteTriggerRepository::new(pool.clone())),
        Arc::new(InMemoryHookBus::new()),
        OrchestratorConfig::default(),
    )
}

#[tokio::test]
async fn auto_approved_proposal_materializes_into_an_active_mission() {
    let pool = create_migrated_test_pool().await.expect("migrated pool");
    let project_repo = SqliteProjectRepository::new(pool.clone());
    let agent_repo = SqliteAgentRepository::new(pool.clone());
    let proposal_repo = SqliteProposalRepository::new(pool.clone());
    let mission_repo = SqliteMissionRepository::new(pool.clone());
    let step_repo = SqliteStepRepository::new(pool.clone());

    let (project, agent) = seed_project_and_agent(&project_repo, &agent_repo).await;

    let mut proposal = Proposal::new(
        agent.id,
        project.id,
        "Fix checkout total rounding",
        "Totals are off by a cent on some carts",
        "Customer complaints filed this week",
        ProposalPriority::Medium,
    );
    proposal.auto_approve = true;
    proposal_repo.create(&proposal).await.expect("create proposal");

    let orchestrator = build_orchestrator(&pool);

    // Tick 1: approval (phase 2) + mission materialization (phase 4) +
    // step materialization (phase 5) all happen in the same pass.
    let result = orchestrator.tick().await;
    assert!(result.errors.is_empty(), "tick errors: {:?}", result.errors);
    assert_eq!(result.proposals_approved, 1);
    assert_eq!(result.missions_created, 1);
    assert!(result.steps_created > 0);

    let missions = mission_repo
        .list(MissionFilter { project_id: Some(project.id), status: Some(MissionStatus::Active) })
        .await
        .expect("list missions");
    assert_eq!(missions.len(), 1);

    let steps = step_repo.list_by_mission(missions[0].id).await.expect("list steps");
    assert!(!steps.is_empty());
    assert!(steps.iter().all(|s| s.status == StepStatus::Pending));
}

#[tokio::test]
async fn mission_closes_once_every_step_completes() {
    let pool = create_migrated_test_pool().await.expect("migrated pool");
    let project_repo = SqliteProjectRepository::new(pool.clone());
    let agent_repo = SqliteAgentRepository::new(pool.clone());
    let proposal_repo = SqliteProposalRepository::new(pool.clone());
    let mission_repo = SqliteMissionRepository::new(pool.clone());
    let step_repo = SqliteStepRepository::new(pool.clone());

    let (project, agent) = seed_project_and_agent(&project_repo, &agent_repo).await;

    let mut proposal = Proposal::new(
        agent.id,
        project.id,
        "Add test coverage for discount codes",
        "No tests cover the discount-stacking path",
        "Flagged in review",
        ProposalPriority::Low,
    );
    proposal.auto_approve = true;
    proposal_repo.create(&proposal).await.expect("create proposal");

    let orchestrator = build_orchestrator(&pool);
    orchestrator.tick().await;

    let missions = mission_repo
        .list(MissionFilter { project_id: Some(project.id), status: Some(MissionStatus::Active) })
        .await
        .expect("list missions");
    let mission = missions.into_iter().next().expect("mission materialized");

    let mut steps = step_repo.list_by_mission(mission.id).await.expect("list steps");
    for step in &mut steps {
        step.status = StepStatus::Completed;
        step_repo.update(step).await.expect("complete step");
    }

    let result = orchestrator.tick().await;
    assert!(result.errors.is_empty(), "tick errors: {:?}", result.errors);
    assert_eq!(result.missions_closed, 1);

    let closed = mission_repo.get(mission.id).await.expect("get mission").expect("mission exists");
    assert_eq!(closed.status, MissionStatus::Completed);
    assert!(closed.completed_at.is_some());
}

#[tokio::test]
async fn non_auto_approve_proposal_stays_pending_and_materializes_nothing() {
    let pool = create_migrated_test_pool().await.expect("migrated pool");
    let project_repo = SqliteProjectRepository::new(pool.clone());
    let agent_repo = SqliteAgentRepository::new(pool.clone());
    let proposal_repo = SqliteProposalRepository::new(pool.clone());

    let (project, agent) = seed_project_and_agent(&project_repo, &agent_repo).await;

    let proposal = Proposal::new(
        agent.id,
        project.id,
        "Redesign checkout layout",
        "Speculative, needs product sign-off",
        "Proposed by the design agent",
        ProposalPriority::High,
    );
    proposal_repo.create(&proposal).await.expect("create proposal");

    let orchestrator = build_orchestrator(&pool);
    let result = orchestrator.tick().await;

    assert!(result.errors.is_empty(), "tick errors: {:?}", result.errors);
    assert_eq!(result.proposals_approved, 0);
    assert_eq!(result.missions_created, 0);
}
