//! Proposal domain model — a human/agent-originated intent gated on approval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl ProposalPriority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Inbound sync priority mapping (spec §4.1 phase 1): unknown or
    /// missing values default to MEDIUM.
    #[must_use]
    pub fn from_board_value(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "critical" => Self::Critical,
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }

    /// `auto_approve := priority in {CRITICAL, HIGH}` for board-synced
    /// proposals (spec §4.1 phase 1).
    #[must_use]
    pub const fn implies_auto_approve(self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Expired,
}

impl ProposalStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Approved | Self::Rejected | Self::Expired)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub rationale: String,
    pub priority: ProposalPriority,
    pub status: ProposalStatus,
    pub auto_approve: bool,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Deduplication key for inbound board syncs (I5).
    pub mc_task_id: Option<String>,
    pub mc_board_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Proposal {
    #[must_use]
    pub fn new(
        agent_id: Uuid,
        project_id: Uuid,
        title: impl Into<String>,
        description: impl Into<String>,
        rationale: impl Into<String>,
        priority: ProposalPriority,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            agent_id,
            project_id,
            title: title.into(),
            description: description.into(),
            rationale: rationale.into(),
            priority,
            status: ProposalStatus::Pending,
            auto_approve: false,
            reviewed_by: None,
            reviewed_at: None,
            mc_task_id: None,
            mc_board_id: None,
            created_at: Utc::now(),
        }
    }
}
