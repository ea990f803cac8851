//! `agentloop project` commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use sqlx::SqlitePool;

use crate::adapters::sqlite::SqliteProjectRepository;
use crate::cli::output::projects_table;
use crate::domain::models::{Project, ProjectStatus};
use crate::domain::ports::{ProjectFilter, ProjectRepository};

#[derive(Args, Debug)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommands {
    /// Register a new project.
    Add {
        name: String,
        slug: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        repo_path: Option<String>,
    },
    /// List projects.
    List,
    /// Pause a project (stops inbound sync and new materialization).
    Pause { slug: String },
    /// Resume a paused project.
    Resume { slug: String },
}

pub async fn handle(pool: SqlitePool, args: ProjectArgs, json: bool) -> Result<()> {
    let repo = SqliteProjectRepository::new(pool);

    match args.command {
        ProjectCommands::Add { name, slug, description, repo_path } => {
            let mut project = Project::new(name, slug, description);
            project.repo_path = repo_path;
            repo.create(&project).await.context("failed to create project")?;
            println!("Created project {} ({})", project.slug, project.id);
        }
        ProjectCommands::List => {
            let projects = repo.list(ProjectFilter::default()).await.context("failed to list projects")?;
            print_projects(&projects, json);
        }
        ProjectCommands::Pause { slug } => set_status(&repo, &slug, ProjectStatus::Paused).await?,
        ProjectCommands::Resume { slug } => set_status(&repo, &slug, ProjectStatus::Active).await?,
    }
    Ok(())
}

async fn set_status(repo: &SqliteProjectRepository, slug: &str, status: ProjectStatus) -> Result<()> {
    let mut project = repo
        .get_by_slug(slug)
        .await
        .context("failed to look up project")?
        .with_context(|| format!("no project with slug '{slug}'"))?;
    project.status = status;
    repo.update(&project).await.context("failed to update project")?;
    println!("Project '{slug}' is now {}", status.as_str());
    Ok(())
}

fn print_projects(projects: &[Project], json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(projects).unwrap_or_default());
    } else {
        println!("{}", projects_table(projects));
    }
}
