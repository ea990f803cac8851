//! SQLite implementation of AgentRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_optional_datetime, parse_uuid};
use crate::domain::errors::DomainResult;
use crate::domain::models::{Agent, AgentConfig, AgentPose, AgentStatus};
use crate::domain::ports::{AgentFilter, AgentRepository};

#[derive(Clone)]
pub struct SqliteAgentRepository {
    pool: SqlitePool,
}

impl SqliteAgentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AgentRow {
    id: String,
    name: String,
    role: String,
    project_id: String,
    status: String,
    config_json: String,
    last_seen_at: Option<String>,
    pose_json: String,
    created_at: String,
}

fn row_to_agent(row: AgentRow) -> DomainResult<Agent> {
    let config: AgentConfig = serde_json::from_str(&row.config_json).unwrap_or_else(|e| {
        tracing::warn!(agent_id = %row.id, error = %e, "malformed agent config, falling back to permissive");
        AgentConfig::permissive()
    });
    let pose: AgentPose = serde_json::from_str(&row.pose_json).unwrap_or_default();
    Ok(Agent {
        id: parse_uuid(&row.id)?,
        name: row.name,
        role: row.role,
        project_id: parse_uuid(&row.project_id)?,
        status: AgentStatus::from_str(&row.status).unwrap_or(AgentStatus::Active),
        config,
        last_seen_at: parse_optional_datetime(row.last_seen_at)?,
        pose,
        created_at: parse_datetime(&row.created_at)?,
    })
}

#[async_trait]
impl AgentRepository for SqliteAgentRepository {
    async fn create(&self, agent: &Agent) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO agents
               (id, name, role, project_id, status, config_json, last_seen_at, pose_json, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(agent.id.to_string())
        .bind(&agent.name)
        .bind(&agent.role)
        .bind(agent.project_id.to_string())
        .bind(agent.status.as_str())
        .bind(serde_json::to_string(&agent.config)?)
        .bind(agent.last_seen_at.map(|t| t.to_rfc3339()))
        .bind(serde_json::to_string(&agent.pose)?)
        .bind(agent.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Agent>> {
        let row: Option<AgentRow> = sqlx::query_as("SELECT * FROM agents WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_agent).transpose()
    }

    async fn update(&self, agent: &Agent) -> DomainResult<()> {
        sqlx::query(
            r#"UPDATE agents SET name = ?, role = ?, status = ?, config_json = ?,
               last_seen_at = ?, pose_json = ? WHERE id = ?"#,
        )
        .bind(&agent.name)
        .bind(&agent.role)
        .bind(agent.status.as_str())
        .bind(serde_json::to_string(&agent.config)?)
        .bind(agent.last_seen_at.map(|t| t.to_rfc3339()))
        .bind(serde_json::to_string(&agent.pose)?)
        .bind(agent.id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, filter: AgentFilter) -> DomainResult<Vec<Agent>> {
        let rows: Vec<AgentRow> = match (filter.project_id, filter.status) {
            (Some(project_id), Some(status)) => {
                sqlx::query_as("SELECT * FROM agents WHERE project_id = ? AND status = ? ORDER BY created_at")
                    .bind(project_id.to_string())
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            (Some(project_id), None) => {
                sqlx::query_as("SELECT * FROM agents WHERE project_id = ? ORDER BY created_at")
                    .bind(project_id.to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, Some(status)) => {
                sqlx::query_as("SELECT * FROM agents WHERE status = ? ORDER BY created_at")
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, None) => {
                sqlx::query_as("SELECT * FROM agents ORDER BY created_at")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter().map(row_to_agent).collect()
    }

    async fn first_active_in_project(&self, project_id: Uuid) -> DomainResult<Option<Agent>> {
        let row: Option<AgentRow> = sqlx::query_as(
            "SELECT * FROM agents WHERE project_id = ? AND status = 'active' ORDER BY created_at ASC LIMIT 1",
        )
        .bind(project_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(row_to_agent).transpose()
    }
}
