//! SQLite implementation of ProjectRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::parse_uuid;
use crate::domain::errors::DomainResult;
use crate::domain::models::{Project, ProjectStatus};
use crate::domain::ports::{ProjectFilter, ProjectRepository};

#[derive(Clone)]
pub struct SqliteProjectRepository {
    pool: SqlitePool,
}

impl SqliteProjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProjectRow {
    id: String,
    name: String,
    slug: String,
    description: String,
    repo_path: Option<String>,
    status: String,
    config_json: String,
    created_at: String,
}

fn row_to_project(row: ProjectRow) -> DomainResult<Project> {
    Ok(Project {
        id: parse_uuid(&row.id)?,
        name: row.name,
        slug: row.slug,
        description: row.description,
        repo_path: row.repo_path,
        status: ProjectStatus::from_str(&row.status).unwrap_or(ProjectStatus::Active),
        config: serde_json::from_str(&row.config_json)?,
        created_at: crate::adapters::sqlite::parse_datetime(&row.created_at)?,
    })
}

#[async_trait]
impl ProjectRepository for SqliteProjectRepository {
    async fn create(&self, project: &Project) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO projects (id, name, slug, description, repo_path, status, config_json, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(project.id.to_string())
        .bind(&project.name)
        .bind(&project.slug)
        .bind(&project.description)
        .bind(&project.repo_path)
        .bind(project.status.as_str())
        .bind(serde_json::to_string(&project.config)?)
        .bind(project.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Project>> {
        let row: Option<ProjectRow> = sqlx::query_as("SELECT * FROM projects WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_project).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> DomainResult<Option<Project>> {
        let row: Option<ProjectRow> = sqlx::query_as("SELECT * FROM projects WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_project).transpose()
    }

    async fn update(&self, project: &Project) -> DomainResult<()> {
        sqlx::query(
            r#"UPDATE projects SET name = ?, slug = ?, description = ?, repo_path = ?,
               status = ?, config_json = ? WHERE id = ?"#,
        )
        .bind(&project.name)
        .bind(&project.slug)
        .bind(&project.description)
        .bind(&project.repo_path)
        .bind(project.status.as_str())
        .bind(serde_json::to_string(&project.config)?)
        .bind(project.id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, filter: ProjectFilter) -> DomainResult<Vec<Project>> {
        let rows: Vec<ProjectRow> = match filter.status {
            Some(status) => {
                sqlx::query_as("SELECT * FROM projects WHERE status = ? ORDER BY created_at")
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT * FROM projects ORDER BY created_at")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter().map(row_to_project).collect()
    }
}
