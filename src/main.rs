//! Binary entry point: parses the CLI, loads config, initializes logging
//! and the audit trail, opens the store, and dispatches to a command
//! handler (spec §6).

use anyhow::{Context, Result};
use clap::Parser;

use agentloop::adapters::sqlite::create_pool;
use agentloop::cli::commands::{agent, init, project, proposal, serve, trigger};
use agentloop::cli::{Cli, Commands};
use agentloop::infrastructure::config::ConfigLoader;
use agentloop::infrastructure::logging::{AuditEventType, AuditLog, AuditOutcome, LoggerHandle};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ConfigLoader::load().context("failed to load configuration")?;

    let _logger = LoggerHandle::init(&config.logging, Some(".agentloop/logs")).context("failed to initialize logging")?;
    tracing::debug!(store_url = %config.store_url, "configuration loaded");

    let audit = AuditLog::open(".agentloop/audit.jsonl").ok();
    if let Some(audit) = &audit {
        audit
            .record(AuditEventType::ConfigLoaded, "load_config", "system", None, AuditOutcome::Success, None)
            .ok();
    }

    if matches!(cli.command, Commands::Init) {
        return init::handle_init(&config.store_url, cli.json).await;
    }

    let pool = create_pool(&config.store_url, None)
        .await
        .context("failed to open store (did you run `agentloop init`?)")?;

    match cli.command {
        Commands::Init => unreachable!("handled above"),
        Commands::Tick => serve::handle_tick(pool, &config, audit.as_ref(), cli.json).await,
        Commands::Serve => serve::handle_serve(pool, config, audit.as_ref()).await,
        Commands::Project(args) => project::handle(pool, args, cli.json).await,
        Commands::Agent(args) => agent::handle(pool, args, cli.json).await,
        Commands::Proposal(args) => proposal::handle(pool, args, audit.as_ref(), cli.json).await,
        Commands::Trigger(args) => trigger::handle(pool, args, cli.json).await,
    }
}
