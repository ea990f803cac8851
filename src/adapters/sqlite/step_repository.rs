//! SQLite implementation of StepRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_optional_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::DomainResult;
use crate::domain::models::{Step, StepStatus, StepType};
use crate::domain::ports::{StepFilter, StepRepository};

#[derive(Clone)]
pub struct SqliteStepRepository {
    pool: SqlitePool,
}

impl SqliteStepRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StepRow {
    id: String,
    mission_id: String,
    order_index: i64,
    title: String,
    description: String,
    step_type: String,
    status: String,
    claimed_by_agent_id: Option<String>,
    output: Option<String>,
    error: Option<String>,
    started_at: Option<String>,
    completed_at: Option<String>,
    created_at: String,
}

fn row_to_step(row: StepRow) -> DomainResult<Step> {
    Ok(Step {
        id: parse_uuid(&row.id)?,
        mission_id: parse_uuid(&row.mission_id)?,
        #[allow(clippy::cast_possible_truncation)]
        order_index: row.order_index as i32,
        title: row.title,
        description: row.description,
        step_type: StepType::from_str(&row.step_type).unwrap_or_default(),
        status: StepStatus::from_str(&row.status).unwrap_or(StepStatus::Pending),
        claimed_by_agent_id: parse_optional_uuid(row.claimed_by_agent_id)?,
        output: row.output,
        error: row.error,
        started_at: parse_optional_datetime(row.started_at)?,
        completed_at: parse_optional_datetime(row.completed_at)?,
        created_at: parse_datetime(&row.created_at)?,
    })
}

#[async_trait]
impl StepRepository for SqliteStepRepository {
    async fn create(&self, step: &Step) -> DomainResult<()> {
        insert_step(&self.pool, step).await
    }

    async fn create_many(&self, steps: &[Step]) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;
        for step in steps {
            sqlx::query(
                r#"INSERT INTO steps
                   (id, mission_id, order_index, title, description, step_type, status,
                    claimed_by_agent_id, output, error, started_at, completed_at, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(step.id.to_string())
            .bind(step.mission_id.to_string())
            .bind(step.order_index)
            .bind(&step.title)
            .bind(&step.description)
            .bind(step.step_type.as_str())
            .bind(step.status.as_str())
            .bind(step.claimed_by_agent_id.map(|id| id.to_string()))
            .bind(&step.output)
            .bind(&step.error)
            .bind(step.started_at.map(|t| t.to_rfc3339()))
            .bind(step.completed_at.map(|t| t.to_rfc3339()))
            .bind(step.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Step>> {
        let row: Option<StepRow> = sqlx::query_as("SELECT * FROM steps WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_step).transpose()
    }

    async fn update(&self, step: &Step) -> DomainResult<()> {
        sqlx::query(
            r#"UPDATE steps SET title = ?, description = ?, step_type = ?, status = ?,
               claimed_by_agent_id = ?, output = ?, error = ?, started_at = ?, completed_at = ?
               WHERE id = ?"#,
        )
        .bind(&step.title)
        .bind(&step.description)
        .bind(step.step_type.as_str())
        .bind(step.status.as_str())
        .bind(step.claimed_by_agent_id.map(|id| id.to_string()))
        .bind(&step.output)
        .bind(&step.error)
        .bind(step.started_at.map(|t| t.to_rfc3339()))
        .bind(step.completed_at.map(|t| t.to_rfc3339()))
        .bind(step.id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, filter: StepFilter) -> DomainResult<Vec<Step>> {
        let rows: Vec<StepRow> = match (filter.mission_id, filter.status) {
            (Some(mission_id), Some(status)) => {
                sqlx::query_as("SELECT * FROM steps WHERE mission_id = ? AND status = ? ORDER BY order_index")
                    .bind(mission_id.to_string())
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            (Some(mission_id), None) => {
                sqlx::query_as("SELECT * FROM steps WHERE mission_id = ? ORDER BY order_index")
                    .bind(mission_id.to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, Some(status)) => {
                sqlx::query_as("SELECT * FROM steps WHERE status = ? ORDER BY created_at")
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, None) => {
                sqlx::query_as("SELECT * FROM steps ORDER BY created_at")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter().map(row_to_step).collect()
    }

    async fn list_by_mission(&self, mission_id: Uuid) -> DomainResult<Vec<Step>> {
        let rows: Vec<StepRow> = sqlx::query_as("SELECT * FROM steps WHERE mission_id = ? ORDER BY order_index")
            .bind(mission_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_step).collect()
    }

    async fn list_selectable_for_agent(&self, project_id: Uuid, agent_id: Uuid) -> DomainResult<Vec<Step>> {
        let rows: Vec<StepRow> = sqlx::query_as(
            r#"SELECT s.* FROM steps s
               JOIN missions m ON m.id = s.mission_id
               WHERE m.project_id = ?
                 AND s.status IN ('pending', 'claimed')
                 AND (s.claimed_by_agent_id IS NULL OR s.claimed_by_agent_id = ?)
               ORDER BY s.order_index, s.created_at"#,
        )
        .bind(project_id.to_string())
        .bind(agent_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_step).collect()
    }
}

async fn insert_step(pool: &SqlitePool, step: &Step) -> DomainResult<()> {
    sqlx::query(
        r#"INSERT INTO steps
           (id, mission_id, order_index, title, description, step_type, status,
            claimed_by_agent_id, output, error, started_at, completed_at, created_at)
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(step.id.to_string())
    .bind(step.mission_id.to_string())
    .bind(step.order_index)
    .bind(&step.title)
    .bind(&step.description)
    .bind(step.step_type.as_str())
    .bind(step.status.as_str())
    .bind(step.claimed_by_agent_id.map(|id| id.to_string()))
    .bind(&step.output)
    .bind(&step.error)
    .bind(step.started_at.map(|t| t.to_rfc3339()))
    .bind(step.completed_at.map(|t| t.to_rfc3339()))
    .bind(step.created_at.to_rfc3339())
    .execute(pool)
    .await?;
    Ok(())
}
