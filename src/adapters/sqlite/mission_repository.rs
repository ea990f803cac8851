//! SQLite implementation of MissionRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_optional_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::DomainResult;
use crate::domain::models::{Mission, MissionStatus};
use crate::domain::ports::{MissionFilter, MissionRepository};

#[derive(Clone)]
pub struct SqliteMissionRepository {
    pool: SqlitePool,
}

impl SqliteMissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MissionRow {
    id: String,
    proposal_id: String,
    project_id: String,
    title: String,
    description: String,
    status: String,
    assigned_agent_id: Option<String>,
    completed_at: Option<String>,
    created_at: String,
}

fn row_to_mission(row: MissionRow) -> DomainResult<Mission> {
    Ok(Mission {
        id: parse_uuid(&row.id)?,
        proposal_id: parse_uuid(&row.proposal_id)?,
        project_id: parse_uuid(&row.project_id)?,
        title: row.title,
        description: row.description,
        status: MissionStatus::from_str(&row.status).unwrap_or(MissionStatus::Planned),
        assigned_agent_id: parse_optional_uuid(row.assigned_agent_id)?,
        completed_at: parse_optional_datetime(row.completed_at)?,
        created_at: parse_datetime(&row.created_at)?,
    })
}

#[async_trait]
impl MissionRepository for SqliteMissionRepository {
    async fn create(&self, mission: &Mission) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO missions
               (id, proposal_id, project_id, title, description, status, assigned_agent_id, completed_at, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(mission.id.to_string())
        .bind(mission.proposal_id.to_string())
        .bind(mission.project_id.to_string())
        .bind(&mission.title)
        .bind(&mission.description)
        .bind(mission.status.as_str())
        .bind(mission.assigned_agent_id.map(|id| id.to_string()))
        .bind(mission.completed_at.map(|t| t.to_rfc3339()))
        .bind(mission.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Mission>> {
        let row: Option<MissionRow> = sqlx::query_as("SELECT * FROM missions WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_mission).transpose()
    }

    async fn get_by_proposal(&self, proposal_id: Uuid) -> DomainResult<Option<Mission>> {
        let row: Option<MissionRow> = sqlx::query_as("SELECT * FROM missions WHERE proposal_id = ?")
            .bind(proposal_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_mission).transpose()
    }

    async fn update(&self, mission: &Mission) -> DomainResult<()> {
        sqlx::query(
            r#"UPDATE missions SET title = ?, description = ?, status = ?,
               assigned_agent_id = ?, completed_at = ? WHERE id = ?"#,
        )
        .bind(&mission.title)
        .bind(&mission.description)
        .bind(mission.status.as_str())
        .bind(mission.assigned_agent_id.map(|id| id.to_string()))
        .bind(mission.completed_at.map(|t| t.to_rfc3339()))
        .bind(mission.id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, filter: MissionFilter) -> DomainResult<Vec<Mission>> {
        let rows: Vec<MissionRow> = match (filter.project_id, filter.status) {
            (Some(project_id), Some(status)) => {
                sqlx::query_as("SELECT * FROM missions WHERE project_id = ? AND status = ? ORDER BY created_at")
                    .bind(project_id.to_string())
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            (Some(project_id), None) => {
                sqlx::query_as("SELECT * FROM missions WHERE project_id = ? ORDER BY created_at")
                    .bind(project_id.to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, Some(status)) => {
                sqlx::query_as("SELECT * FROM missions WHERE status = ? ORDER BY created_at")
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, None) => {
                sqlx::query_as("SELECT * FROM missions ORDER BY created_at")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter().map(row_to_mission).collect()
    }
}
