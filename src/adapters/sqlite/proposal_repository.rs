//! SQLite implementation of ProposalRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{parse_datetime, parse_optional_datetime, parse_uuid};
use crate::domain::errors::DomainResult;
use crate::domain::models::{Proposal, ProposalPriority, ProposalStatus};
use crate::domain::ports::{ProposalFilter, ProposalRepository};

#[derive(Clone)]
pub struct SqliteProposalRepository {
    pool: SqlitePool,
}

impl SqliteProposalRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProposalRow {
    id: String,
    agent_id: String,
    project_id: String,
    title: String,
    description: String,
    rationale: String,
    priority: String,
    status: String,
    auto_approve: i64,
    reviewed_by: Option<String>,
    reviewed_at: Option<String>,
    mc_task_id: Option<String>,
    mc_board_id: Option<String>,
    created_at: String,
}

fn row_to_proposal(row: ProposalRow) -> DomainResult<Proposal> {
    Ok(Proposal {
        id: parse_uuid(&row.id)?,
        agent_id: parse_uuid(&row.agent_id)?,
        project_id: parse_uuid(&row.project_id)?,
        title: row.title,
        description: row.description,
        rationale: row.rationale,
        priority: ProposalPriority::from_board_value(&row.priority),
        status: ProposalStatus::from_str(&row.status).unwrap_or(ProposalStatus::Pending),
        auto_approve: row.auto_approve != 0,
        reviewed_by: row.reviewed_by,
        reviewed_at: parse_optional_datetime(row.reviewed_at)?,
        mc_task_id: row.mc_task_id,
        mc_board_id: row.mc_board_id,
        created_at: parse_datetime(&row.created_at)?,
    })
}

#[async_trait]
impl ProposalRepository for SqliteProposalRepository {
    async fn create(&self, proposal: &Proposal) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO proposals
               (id, agent_id, project_id, title, description, rationale, priority, status,
                auto_approve, reviewed_by, reviewed_at, mc_task_id, mc_board_id, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(proposal.id.to_string())
        .bind(proposal.agent_id.to_string())
        .bind(proposal.project_id.to_string())
        .bind(&proposal.title)
        .bind(&proposal.description)
        .bind(&proposal.rationale)
        .bind(proposal.priority.as_str())
        .bind(proposal.status.as_str())
        .bind(i64::from(proposal.auto_approve))
        .bind(&proposal.reviewed_by)
        .bind(proposal.reviewed_at.map(|t| t.to_rfc3339()))
        .bind(&proposal.mc_task_id)
        .bind(&proposal.mc_board_id)
        .bind(proposal.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Proposal>> {
        let row: Option<ProposalRow> = sqlx::query_as("SELECT * FROM proposals WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_proposal).transpose()
    }

    async fn get_by_mc_task_id(&self, mc_task_id: &str) -> DomainResult<Option<Proposal>> {
        let row: Option<ProposalRow> = sqlx::query_as("SELECT * FROM proposals WHERE mc_task_id = ?")
            .bind(mc_task_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(row_to_proposal).transpose()
    }

    async fn update(&self, proposal: &Proposal) -> DomainResult<()> {
        sqlx::query(
            r#"UPDATE proposals SET title = ?, description = ?, rationale = ?, priority = ?,
               status = ?, auto_approve = ?, reviewed_by = ?, reviewed_at = ?,
               mc_task_id = ?, mc_board_id = ? WHERE id = ?"#,
        )
        .bind(&proposal.title)
        .bind(&proposal.description)
        .bind(&proposal.rationale)
        .bind(proposal.priority.as_str())
        .bind(proposal.status.as_str())
        .bind(i64::from(proposal.auto_approve))
        .bind(&proposal.reviewed_by)
        .bind(proposal.reviewed_at.map(|t| t.to_rfc3339()))
        .bind(&proposal.mc_task_id)
        .bind(&proposal.mc_board_id)
        .bind(proposal.id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list(&self, filter: ProposalFilter) -> DomainResult<Vec<Proposal>> {
        let rows: Vec<ProposalRow> = match (filter.project_id, filter.status) {
            (Some(project_id), Some(status)) => {
                sqlx::query_as("SELECT * FROM proposals WHERE project_id = ? AND status = ? ORDER BY created_at")
                    .bind(project_id.to_string())
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            (Some(project_id), None) => {
                sqlx::query_as("SELECT * FROM proposals WHERE project_id = ? ORDER BY created_at")
                    .bind(project_id.to_string())
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, Some(status)) => {
                sqlx::query_as("SELECT * FROM proposals WHERE status = ? ORDER BY created_at")
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, None) => {
                sqlx::query_as("SELECT * FROM proposals ORDER BY created_at")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.into_iter().map(row_to_proposal).collect()
    }

    async fn list_pending_before(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<Proposal>> {
        let rows: Vec<ProposalRow> = sqlx::query_as(
            "SELECT * FROM proposals WHERE status = 'pending' AND created_at < ? ORDER BY created_at",
        )
        .bind(cutoff.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(row_to_proposal).collect()
    }
}
