//! SQLite implementation of EventRepository (I6: append-only).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_optional_uuid, parse_uuid};
use crate::domain::errors::DomainResult;
use crate::domain::models::Event;
use crate::domain::ports::EventRepository;

#[derive(Clone)]
pub struct SqliteEventRepository {
    pool: SqlitePool,
}

impl SqliteEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: String,
    event_type: String,
    source_agent_id: Option<String>,
    project_id: String,
    payload_json: String,
    created_at: String,
}

fn row_to_event(row: EventRow) -> DomainResult<Event> {
    Ok(Event {
        id: parse_uuid(&row.id)?,
        event_type: row.event_type,
        source_agent_id: parse_optional_uuid(row.source_agent_id)?,
        project_id: parse_uuid(&row.project_id)?,
        payload: serde_json::from_str(&row.payload_json)?,
        created_at: parse_datetime(&row.created_at)?,
    })
}

#[async_trait]
impl EventRepository for SqliteEventRepository {
    async fn append(&self, event: &Event) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO events (id, event_type, source_agent_id, project_id, payload_json, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(event.id.to_string())
        .bind(&event.event_type)
        .bind(event.source_agent_id.map(|id| id.to_string()))
        .bind(event.project_id.to_string())
        .bind(serde_json::to_string(&event.payload)?)
        .bind(event.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_since(&self, project_id: Uuid, since: DateTime<Utc>) -> DomainResult<Vec<Event>> {
        let rows: Vec<EventRow> = sqlx::query_as(
            "SELECT * FROM events WHERE project_id = ? AND created_at >= ? ORDER BY created_at",
        )
        .bind(project_id.to_string())
        .bind(since.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_event).collect()
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM events WHERE created_at < ?")
            .bind(cutoff.to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
