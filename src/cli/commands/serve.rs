//! `agentloop tick` / `agentloop serve` — run the orchestrator once, or
//! loop it alongside worker engines and the board stream (spec §4, §6).

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::SqlitePool;

use crate::adapters::board::{BoardHttpConfig, BoardStreamFrame, HttpBoardClient, StreamIngestor};
use crate::adapters::dispatchers::{
    ChatCompletionDispatcher, ChatDispatcherConfig, CliSubprocessConfig, CliSubprocessDispatcher,
    DispatcherRegistry,
};
use crate::adapters::sqlite::{
    SqliteAgentRepository, SqliteEventRepository, SqliteMissionRepository,
    SqliteProjectContextRepository, SqliteProjectRepository, SqliteProposalRepository,
    SqliteStepRepository, SqliteTriggerRepository,
};
use crate::domain::ports::{AgentFilter, AgentRepository};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::logging::AuditLog;
use crate::services::worker_engine::WorkerEngine;
use crate::services::{builtin_plugins, BoardMapping, InMemoryHookBus, Orchestrator, OrchestratorConfig, PluginManager};

type Engine = WorkerEngine<
    SqliteStepRepository,
    SqliteMissionRepository,
    SqliteProjectRepository,
    SqliteAgentRepository,
    SqliteProjectContextRepository,
    DispatcherRegistry,
>;

fn build_dispatcher(config: &AppConfig) -> DispatcherRegistry {
    if let Some(cli_name) = &config.dispatcher.cli_name {
        return DispatcherRegistry::CliSubprocess(CliSubprocessDispatcher::new(CliSubprocessConfig {
            binary_path: cli_name.clone(),
            ..Default::default()
        }));
    }
    DispatcherRegistry::Chat(ChatCompletionDispatcher::new(ChatDispatcherConfig {
        provider: "openai".to_string(),
        model: config.dispatcher.model.clone().unwrap_or_else(|| "gpt-4o-mini".to_string()),
        base_url: config.dispatcher.base_url.clone().unwrap_or_else(|| "https://api.openai.com".to_string()),
        api_key: config.dispatcher.api_key.clone().unwrap_or_default(),
        max_retries: 3,
    }))
}

fn build_orchestrator(pool: &SqlitePool, config: &AppConfig, audit: Option<&AuditLog>) -> Orchestrator {
    let mappings = config
        .board
        .map
        .iter()
        .map(|(board_id, project_slug)| BoardMapping { board_id: board_id.clone(), project_slug: project_slug.clone() })
        .collect();

    let orchestrator_config = OrchestratorConfig {
        board_mappings: mappings,
        ..OrchestratorConfig::default()
    };

    let mut hook_bus = InMemoryHookBus::new();
    if let Some(audit) = audit {
        PluginManager::new(builtin_plugins(audit.clone())).register_all(&mut hook_bus);
    }

    let orchestrator = Orchestrator::new(
        Arc::new(SqliteProjectRepository::new(pool.clone())),
        Arc::new(SqliteAgentRepository::new(pool.clone())),
        Arc::new(SqliteProposalRepository::new(pool.clone())),
        Arc::new(SqliteMissionRepository::new(pool.clone())),
        Arc::new(SqliteStepRepository::new(pool.clone())),
        Arc::new(SqliteEventRepository::new(pool.clone())),
        Arc::new(SqliteTriggerRepository::new(pool.clone())),
        Arc::new(hook_bus),
        orchestrator_config,
    );

    match (&config.board.base_url, &config.board.token) {
        (Some(base_url), Some(token)) => {
            let client = HttpBoardClient::new(BoardHttpConfig {
                base_url: base_url.clone(),
                token: token.clone(),
                org_id: config.board.org_id.clone(),
                requests_per_minute: 60,
            });
            orchestrator.with_board_client(Arc::new(client))
        }
        _ => orchestrator,
    }
}

fn build_worker_engine(pool: &SqlitePool, config: &AppConfig) -> Engine {
    WorkerEngine::new(
        Arc::new(SqliteStepRepository::new(pool.clone())),
        Arc::new(SqliteMissionRepository::new(pool.clone())),
        Arc::new(SqliteProjectRepository::new(pool.clone())),
        Arc::new(SqliteAgentRepository::new(pool.clone())),
        Arc::new(SqliteProjectContextRepository::new(pool.clone())),
        Arc::new(SqliteEventRepository::new(pool.clone())),
        Arc::new(build_dispatcher(config)),
    )
    .with_step_timeout(Duration::from_secs(config.step_timeout_seconds))
}

/// Runs exactly one orchestrator tick and prints its summary.
pub async fn handle_tick(pool: SqlitePool, config: &AppConfig, audit: Option<&AuditLog>, json: bool) -> Result<()> {
    let orchestrator = build_orchestrator(&pool, config, audit);
    let result = orchestrator.tick().await;

    if json {
        println!(
            r#"{{"missions_created":{},"steps_created":{},"missions_closed":{},"missions_escalated":{},"errors":{}}}"#,
            result.missions_created,
            result.steps_created,
            result.missions_closed,
            result.missions_escalated,
            serde_json::to_string(&result.errors).unwrap_or_default(),
        );
    } else {
        println!(
            "tick complete in {}ms: {} proposals created, {} approved, {} missions created, {} steps created, {} closed, {} escalated",
            result.duration_ms,
            result.proposals_created,
            result.proposals_approved,
            result.missions_created,
            result.steps_created,
            result.missions_closed,
            result.missions_escalated,
        );
        for error in &result.errors {
            tracing::warn!(%error, "tick phase failed");
        }
    }
    Ok(())
}

/// Spawns one SSE consumer per mapped board against its `tasks/stream`
/// endpoint (spec §4.6); each received frame posts an intent onto `tx`
/// rather than computing a tick inline. Returns the ingestors so the
/// caller can `stop()` them on shutdown.
fn spawn_stream_ingestors(
    config: &AppConfig,
    tx: tokio::sync::mpsc::Sender<BoardStreamFrame>,
) -> Vec<Arc<StreamIngestor>> {
    let Some(base_url) = &config.board.base_url else { return Vec::new() };

    let mut ingestors = Vec::new();
    for board_id in config.board.map.keys() {
        let ingestor = Arc::new(StreamIngestor::new());
        let sse_url = format!("{base_url}/api/v1/boards/{board_id}/tasks/stream");
        let board_id = board_id.clone();
        let tx = tx.clone();
        let handle = ingestor.clone();
        tokio::spawn(async move { handle.run(&board_id, &sse_url, tx).await });
        ingestors.push(ingestor);
    }
    ingestors
}

/// Loops the orchestrator tick on `orchestrator_tick_interval_seconds` and
/// drives a worker cycle per active agent on `agent_work_interval_seconds`,
/// until SIGINT/SIGTERM (spec §6 "agentloop serve"). Board SSE frames also
/// trigger an out-of-band tick as soon as they arrive.
pub async fn handle_serve(pool: SqlitePool, config: AppConfig, audit: Option<&AuditLog>) -> Result<()> {
    let orchestrator = build_orchestrator(&pool, &config, audit);
    let worker_engine = Arc::new(build_worker_engine(&pool, &config));
    let agent_repo = SqliteAgentRepository::new(pool);

    let tick_interval = Duration::from_secs(config.orchestrator_tick_interval_seconds.max(1));
    let work_interval = Duration::from_secs(config.agent_work_interval_seconds.max(1));

    tracing::info!(tick_interval_secs = tick_interval.as_secs(), work_interval_secs = work_interval.as_secs(), "serve loop starting");

    // `_stream_tx` is kept alive for the whole loop so the channel never
    // closes when no boards are configured; otherwise `stream_rx.recv()`
    // would immediately and repeatedly return `None`.
    let (_stream_tx, mut stream_rx) = tokio::sync::mpsc::channel::<BoardStreamFrame>(64);
    let stream_ingestors = spawn_stream_ingestors(&config, _stream_tx.clone());

    let mut tick_timer = tokio::time::interval(tick_interval);
    let mut work_timer = tokio::time::interval(work_interval);

    loop {
        tokio::select! {
            _ = tick_timer.tick() => {
                let result = orchestrator.tick().await;
                for error in &result.errors {
                    tracing::warn!(%error, "tick phase failed");
                }
            }
            _ = work_timer.tick() => {
                run_worker_cycle(&agent_repo, &worker_engine).await;
            }
            Some(frame) = stream_rx.recv() => {
                tracing::debug!(event = %frame.event, "board stream frame received, running an out-of-band tick");
                let result = orchestrator.tick().await;
                for error in &result.errors {
                    tracing::warn!(%error, "tick phase failed");
                }
            }
            () = shutdown_signal() => {
                tracing::info!("serve loop shutting down");
                for ingestor in &stream_ingestors {
                    ingestor.stop();
                }
                return Ok(());
            }
        }
    }
}

async fn run_worker_cycle(agent_repo: &SqliteAgentRepository, engine: &Arc<Engine>) {
    let agents = match agent_repo
        .list(AgentFilter { project_id: None, status: Some(crate::domain::models::AgentStatus::Active) })
        .await
    {
        Ok(agents) => agents,
        Err(e) => {
            tracing::warn!(error = %e, "failed to list active agents for work cycle");
            return;
        }
    };

    for agent in agents {
        match engine.find_and_execute(agent.id).await {
            Ok(Some(outcome)) => {
                tracing::info!(agent = %agent.name, step_id = %outcome.step_id, status = ?outcome.status, "step dispatched");
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(agent = %agent.name, error = %e, "work cycle failed"),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
