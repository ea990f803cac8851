//! `agentloop agent` commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{SqliteAgentRepository, SqliteProjectRepository};
use crate::cli::output::agents_table;
use crate::domain::models::{Agent, AgentStatus};
use crate::domain::ports::{AgentFilter, AgentRepository, ProjectRepository};

#[derive(Args, Debug)]
pub struct AgentArgs {
    #[command(subcommand)]
    pub command: AgentCommands,
}

#[derive(Subcommand, Debug)]
pub enum AgentCommands {
    /// Register a new agent in a project.
    Add {
        project_slug: String,
        name: String,
        role: String,
        #[arg(long, value_delimiter = ',')]
        capabilities: Vec<String>,
    },
    /// List agents, optionally scoped to a project.
    List {
        #[arg(long)]
        project_slug: Option<String>,
    },
    /// Pause an agent (it stops being selected for work).
    Pause { id: Uuid },
    /// Resume a paused agent.
    Resume { id: Uuid },
}

pub async fn handle(pool: SqlitePool, args: AgentArgs, json: bool) -> Result<()> {
    let agent_repo = SqliteAgentRepository::new(pool.clone());
    let project_repo = SqliteProjectRepository::new(pool);

    match args.command {
        AgentCommands::Add { project_slug, name, role, capabilities } => {
            let project = project_repo
                .get_by_slug(&project_slug)
                .await
                .context("failed to look up project")?
                .with_context(|| format!("no project with slug '{project_slug}'"))?;

            let mut agent = Agent::new(name, role, project.id);
            agent.config.capabilities = capabilities;
            agent_repo.create(&agent).await.context("failed to create agent")?;
            println!("Created agent {} ({})", agent.name, agent.id);
        }
        AgentCommands::List { project_slug } => {
            let project_id = match project_slug {
                Some(slug) => Some(
                    project_repo
                        .get_by_slug(&slug)
                        .await
                        .context("failed to look up project")?
                        .with_context(|| format!("no project with slug '{slug}'"))?
                        .id,
                ),
                None => None,
            };
            let agents = agent_repo
                .list(AgentFilter { project_id, status: None })
                .await
                .context("failed to list agents")?;
            print_agents(&agents, json);
        }
        AgentCommands::Pause { id } => set_status(&agent_repo, id, AgentStatus::Paused).await?,
        AgentCommands::Resume { id } => set_status(&agent_repo, id, AgentStatus::Active).await?,
    }
    Ok(())
}

async fn set_status(repo: &SqliteAgentRepository, id: Uuid, status: AgentStatus) -> Result<()> {
    let mut agent = repo.get(id).await.context("failed to look up agent")?.with_context(|| format!("no agent with id {id}"))?;
    agent.status = status;
    repo.update(&agent).await.context("failed to update agent")?;
    println!("Agent {id} is now {}", status.as_str());
    Ok(())
}

fn print_agents(agents: &[Agent], json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(agents).unwrap_or_default());
    } else {
        println!("{}", agents_table(agents));
    }
}
