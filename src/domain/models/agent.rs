//! Agent domain model — a persistent role-bound worker scoped to one project.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Active,
    Paused,
}

impl AgentStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }
}

/// Capability and dispatcher-override configuration for an agent.
///
/// Capabilities gate which step types a worker may claim (spec §4.4);
/// `auto_approve_proposals` feeds the first auto-approval rule in §4.2.
/// Dispatcher overrides let an agent pin a non-default provider/model/
/// base_url for the generic chat-completion `StepDispatcher`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub auto_approve_proposals: bool,
    #[serde(default)]
    pub dispatcher_provider: Option<String>,
    #[serde(default)]
    pub dispatcher_model: Option<String>,
    #[serde(default)]
    pub dispatcher_base_url: Option<String>,
}

impl AgentConfig {
    #[must_use]
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
            || self.capabilities.iter().any(|c| c == "general_work")
    }

    /// Fallback used when a stored config cannot be parsed: treat the agent
    /// as capable of everything rather than losing it entirely (spec §4.4).
    #[must_use]
    pub fn permissive() -> Self {
        Self { capabilities: vec!["general_work".to_string()], ..Self::default() }
    }
}

/// Presentational pose used only by the out-of-scope UI animation; carried
/// here because it rides along on the same row, but orchestration never
/// reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentPose {
    pub position_x: f64,
    pub position_y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub project_id: Uuid,
    pub status: AgentStatus,
    pub config: AgentConfig,
    pub last_seen_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub pose: AgentPose,
    pub created_at: DateTime<Utc>,
}

impl Agent {
    #[must_use]
    pub fn new(name: impl Into<String>, role: impl Into<String>, project_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            role: role.into(),
            project_id,
            status: AgentStatus::Active,
            config: AgentConfig::default(),
            last_seen_at: None,
            pose: AgentPose::default(),
            created_at: Utc::now(),
        }
    }
}
