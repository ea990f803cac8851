//! Command-line surface (spec §6 "Ambient: CLI surface").

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "agentloop", about = "Multi-agent closed-loop orchestration engine", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Emit machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the store, running embedded migrations.
    Init,
    /// Run exactly one orchestration tick and print the result.
    Tick,
    /// Run the orchestrator loop until SIGTERM/SIGINT.
    Serve,
    /// Manage projects.
    Project(commands::project::ProjectArgs),
    /// Manage agents.
    Agent(commands::agent::AgentArgs),
    /// Manage proposals.
    Proposal(commands::proposal::ProposalArgs),
    /// Manage triggers.
    Trigger(commands::trigger::TriggerArgs),
}
