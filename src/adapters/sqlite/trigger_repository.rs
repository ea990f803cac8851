//! SQLite implementation of TriggerRepository.
//!
//! Actions are stored as raw JSON and decoded through
//! `TriggerAction::from_stored` so an unrecognized tag surfaces as
//! `DomainError::InvalidTrigger` at read time rather than being silently
//! dropped by serde's untagged fallback.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_optional_datetime, parse_uuid};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{EventPattern, Trigger, TriggerAction};
use crate::domain::ports::TriggerRepository;

#[derive(Clone)]
pub struct SqliteTriggerRepository {
    pool: SqlitePool,
}

impl SqliteTriggerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TriggerRow {
    id: String,
    project_id: String,
    name: String,
    event_pattern_json: String,
    action_json: String,
    enabled: i64,
    last_fired_at: Option<String>,
    created_at: String,
}

fn row_to_trigger(row: TriggerRow) -> DomainResult<Trigger> {
    let event_pattern: EventPattern = serde_json::from_str(&row.event_pattern_json)?;
    let action_raw: serde_json::Value = serde_json::from_str(&row.action_json)?;
    let action = TriggerAction::from_stored(&action_raw)?;

    Ok(Trigger {
        id: parse_uuid(&row.id)?,
        project_id: parse_uuid(&row.project_id)?,
        name: row.name,
        event_pattern,
        action,
        enabled: row.enabled != 0,
        last_fired_at: parse_optional_datetime(row.last_fired_at)?,
        created_at: parse_datetime(&row.created_at)?,
    })
}

#[async_trait]
impl TriggerRepository for SqliteTriggerRepository {
    async fn create(&self, trigger: &Trigger) -> DomainResult<()> {
        let existing = self.get_by_name(trigger.project_id, &trigger.name).await?;
        if existing.is_some() {
            return Err(DomainError::DuplicateTriggerName {
                name: trigger.name.clone(),
                project_id: trigger.project_id,
            });
        }

        sqlx::query(
            r#"INSERT INTO triggers
               (id, project_id, name, event_pattern_json, action_json, enabled, last_fired_at, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(trigger.id.to_string())
        .bind(trigger.project_id.to_string())
        .bind(&trigger.name)
        .bind(serde_json::to_string(&trigger.event_pattern)?)
        .bind(serde_json::to_string(&trigger.action)?)
        .bind(i64::from(trigger.enabled))
        .bind(trigger.last_fired_at.map(|t| t.to_rfc3339()))
        .bind(trigger.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Trigger>> {
        let row: Option<TriggerRow> = sqlx::query_as("SELECT * FROM triggers WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_trigger).transpose()
    }

    async fn get_by_name(&self, project_id: Uuid, name: &str) -> DomainResult<Option<Trigger>> {
        let row: Option<TriggerRow> = sqlx::query_as("SELECT * FROM triggers WHERE project_id = ? AND name = ?")
            .bind(project_id.to_string())
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_trigger).transpose()
    }

    async fn update(&self, trigger: &Trigger) -> DomainResult<()> {
        sqlx::query(
            r#"UPDATE triggers SET event_pattern_json = ?, action_json = ?, enabled = ?,
               last_fired_at = ? WHERE id = ?"#,
        )
        .bind(serde_json::to_string(&trigger.event_pattern)?)
        .bind(serde_json::to_string(&trigger.action)?)
        .bind(i64::from(trigger.enabled))
        .bind(trigger.last_fired_at.map(|t| t.to_rfc3339()))
        .bind(trigger.id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DomainResult<()> {
        sqlx::query("DELETE FROM triggers WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self, project_id: Uuid) -> DomainResult<Vec<Trigger>> {
        let rows: Vec<TriggerRow> = sqlx::query_as("SELECT * FROM triggers WHERE project_id = ? ORDER BY created_at")
            .bind(project_id.to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_trigger).collect()
    }

    async fn list_enabled(&self) -> DomainResult<Vec<Trigger>> {
        let rows: Vec<TriggerRow> = sqlx::query_as("SELECT * FROM triggers WHERE enabled = 1 ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(row_to_trigger).collect()
    }
}
