//! SQLite implementation of ProjectContextRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::DomainResult;
use crate::domain::models::ProjectContext;
use crate::domain::ports::ProjectContextRepository;

#[derive(Clone)]
pub struct SqliteProjectContextRepository {
    pool: SqlitePool,
}

impl SqliteProjectContextRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProjectContextRow {
    id: String,
    project_id: String,
    category: String,
    key: String,
    content: String,
    source_agent_id: Option<String>,
    source_step_id: Option<String>,
    created_at: String,
}

fn row_to_context(row: ProjectContextRow) -> DomainResult<ProjectContext> {
    Ok(ProjectContext {
        id: parse_uuid(&row.id)?,
        project_id: parse_uuid(&row.project_id)?,
        category: row.category,
        key: row.key,
        content: row.content,
        source_agent_id: parse_optional_uuid(row.source_agent_id)?,
        source_step_id: parse_optional_uuid(row.source_step_id)?,
        created_at: parse_datetime(&row.created_at)?,
    })
}

#[async_trait]
impl ProjectContextRepository for SqliteProjectContextRepository {
    async fn upsert(&self, context: &ProjectContext) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO project_context
               (id, project_id, category, key, content, source_agent_id, source_step_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(project_id, category, key) DO UPDATE SET
                 content = excluded.content,
                 source_agent_id = excluded.source_agent_id,
                 source_step_id = excluded.source_step_id,
                 created_at = excluded.created_at"#,
        )
        .bind(context.id.to_string())
        .bind(context.project_id.to_string())
        .bind(&context.category)
        .bind(&context.key)
        .bind(&context.content)
        .bind(context.source_agent_id.map(|id| id.to_string()))
        .bind(context.source_step_id.map(|id| id.to_string()))
        .bind(context.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_recent(&self, project_id: Uuid, limit: i64) -> DomainResult<Vec<ProjectContext>> {
        let rows: Vec<ProjectContextRow> = sqlx::query_as(
            "SELECT * FROM project_context WHERE project_id = ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(project_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_context).collect()
    }
}
