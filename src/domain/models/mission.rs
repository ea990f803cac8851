//! Mission domain model — an approved proposal realized as an executable plan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Planned,
    Active,
    Completed,
    Failed,
    Cancelled,
}

impl MissionStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(Self::Planned),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub id: Uuid,
    pub proposal_id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: MissionStatus,
    pub assigned_agent_id: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Mission {
    #[must_use]
    pub fn new(
        proposal_id: Uuid,
        project_id: Uuid,
        title: impl Into<String>,
        description: impl Into<String>,
        assigned_agent_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            proposal_id,
            project_id,
            title: title.into(),
            description: description.into(),
            status: MissionStatus::Planned,
            assigned_agent_id,
            completed_at: None,
            created_at: Utc::now(),
        }
    }
}
