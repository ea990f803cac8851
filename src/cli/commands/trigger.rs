//! `agentloop trigger` commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{SqliteProjectRepository, SqliteTriggerRepository};
use crate::cli::output::triggers_table;
use crate::domain::models::{EventPattern, Trigger, TriggerAction};
use crate::domain::ports::{ProjectRepository, TriggerRepository};

#[derive(Args, Debug)]
pub struct TriggerArgs {
    #[command(subcommand)]
    pub command: TriggerCommands,
}

#[derive(Subcommand, Debug)]
pub enum TriggerCommands {
    /// Register a trigger that creates a step when `event_type` fires.
    Add {
        project_slug: String,
        name: String,
        event_type: String,
        #[arg(long)]
        step_title: Option<String>,
    },
    /// List triggers in a project.
    List { project_slug: String },
    /// Enable a trigger.
    Enable { id: Uuid },
    /// Disable a trigger.
    Disable { id: Uuid },
}

pub async fn handle(pool: SqlitePool, args: TriggerArgs, json: bool) -> Result<()> {
    let trigger_repo = SqliteTriggerRepository::new(pool.clone());
    let project_repo = SqliteProjectRepository::new(pool);

    match args.command {
        TriggerCommands::Add { project_slug, name, event_type, step_title } => {
            let project = project_repo
                .get_by_slug(&project_slug)
                .await
                .context("failed to look up project")?
                .with_context(|| format!("no project with slug '{project_slug}'"))?;

            let pattern = EventPattern { event_type, conditions: Default::default() };
            let action = TriggerAction::CreateStep { title: step_title, description: None, step_type: None, order_index: None };
            let trigger = Trigger::new(project.id, name, pattern, action);
            trigger_repo.create(&trigger).await.context("failed to create trigger")?;
            println!("Created trigger {} ({})", trigger.name, trigger.id);
        }
        TriggerCommands::List { project_slug } => {
            let project = project_repo
                .get_by_slug(&project_slug)
                .await
                .context("failed to look up project")?
                .with_context(|| format!("no project with slug '{project_slug}'"))?;
            let triggers = trigger_repo.list(project.id).await.context("failed to list triggers")?;
            print_triggers(&triggers, json);
        }
        TriggerCommands::Enable { id } => set_enabled(&trigger_repo, id, true).await?,
        TriggerCommands::Disable { id } => set_enabled(&trigger_repo, id, false).await?,
    }
    Ok(())
}

async fn set_enabled(repo: &SqliteTriggerRepository, id: Uuid, enabled: bool) -> Result<()> {
    let mut trigger = repo.get(id).await.context("failed to look up trigger")?.with_context(|| format!("no trigger with id {id}"))?;
    trigger.enabled = enabled;
    repo.update(&trigger).await.context("failed to update trigger")?;
    println!("Trigger {id} is now {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

fn print_triggers(triggers: &[Trigger], json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(triggers).unwrap_or_default());
    } else {
        println!("{}", triggers_table(triggers));
    }
}
