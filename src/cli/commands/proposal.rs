//! `agentloop proposal` commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::adapters::sqlite::{SqliteAgentRepository, SqliteProposalRepository};
use crate::cli::output::proposals_table;
use crate::domain::models::Proposal;
use crate::domain::ports::{ProposalFilter, ProposalRepository};
use crate::infrastructure::logging::{AuditEventType, AuditLog, AuditOutcome};
use crate::services::ApprovalEngine;

#[derive(Args, Debug)]
pub struct ProposalArgs {
    #[command(subcommand)]
    pub command: ProposalCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProposalCommands {
    /// List proposals.
    List {
        #[arg(long)]
        status: Option<String>,
    },
    /// Manually approve a PENDING proposal.
    Approve {
        id: Uuid,
        #[arg(long, default_value = "operator")]
        reviewer: String,
    },
    /// Manually reject a PENDING proposal.
    Reject {
        id: Uuid,
        #[arg(long, default_value = "operator")]
        reviewer: String,
        #[arg(long, default_value = "")]
        reason: String,
    },
}

pub async fn handle(pool: SqlitePool, args: ProposalArgs, audit: Option<&AuditLog>, json: bool) -> Result<()> {
    let proposal_repo = std::sync::Arc::new(SqliteProposalRepository::new(pool.clone()));
    let agent_repo = std::sync::Arc::new(SqliteAgentRepository::new(pool));
    let engine = ApprovalEngine::new(proposal_repo.clone(), agent_repo);

    match args.command {
        ProposalCommands::List { status } => {
            let status = status.and_then(|s| crate::domain::models::ProposalStatus::from_str(&s));
            let proposals = proposal_repo
                .as_ref()
                .list(ProposalFilter { project_id: None, status })
                .await
                .context("failed to list proposals")?;
            print_proposals(&proposals, json);
        }
        ProposalCommands::Approve { id, reviewer } => {
            let proposal = engine.approve(id, &reviewer).await.context("failed to approve proposal")?;
            if let Some(audit) = audit {
                audit
                    .record(AuditEventType::ProposalApproved, "approve_proposal", &reviewer, Some(&id.to_string()), AuditOutcome::Success, None)
                    .ok();
            }
            println!("Approved proposal {} ({})", proposal.title, proposal.id);
        }
        ProposalCommands::Reject { id, reviewer, reason } => {
            let proposal = engine.reject(id, &reviewer, &reason).await.context("failed to reject proposal")?;
            if let Some(audit) = audit {
                audit
                    .record(AuditEventType::ProposalRejected, "reject_proposal", &reviewer, Some(&id.to_string()), AuditOutcome::Success, None)
                    .ok();
            }
            println!("Rejected proposal {} ({})", proposal.title, proposal.id);
        }
    }
    Ok(())
}

fn print_proposals(proposals: &[Proposal], json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(proposals).unwrap_or_default());
    } else {
        println!("{}", proposals_table(proposals));
    }
}
