//! Step domain model.
//!
//! The atomic unit of dispatched work. Steps belong to a mission and move
//! through a strictly-forward status DAG (I2): PENDING -> CLAIMED -> RUNNING
//! -> {COMPLETED | FAILED | SKIPPED}.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Claimed,
    Running,
    Completed,
    Failed,
    Skipped,
}

impl StepStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Claimed => "claimed",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "claimed" => Some(Self::Claimed),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }

    /// I3: a step is claimed iff its status is one of these.
    #[must_use]
    pub const fn implies_claimant(self) -> bool {
        matches!(self, Self::Claimed | Self::Running | Self::Completed | Self::Failed)
    }

    #[must_use]
    pub const fn valid_transitions(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Claimed],
            Self::Claimed => &[Self::Running],
            Self::Running => &[Self::Completed, Self::Failed, Self::Skipped],
            Self::Completed | Self::Failed | Self::Skipped => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, target: Self) -> bool {
        self.valid_transitions().contains(&target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    Code,
    Test,
    Review,
    Deploy,
    Research,
    Security,
    Other,
}

impl StepType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Test => "test",
            Self::Review => "review",
            Self::Deploy => "deploy",
            Self::Research => "research",
            Self::Security => "security",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "code" => Some(Self::Code),
            "test" => Some(Self::Test),
            "review" => Some(Self::Review),
            "deploy" => Some(Self::Deploy),
            "research" => Some(Self::Research),
            "security" => Some(Self::Security),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// The WorkerEngine capability mapping table (spec §4.4).
    #[must_use]
    pub const fn required_capability(self) -> &'static str {
        match self {
            Self::Code => "write_code",
            Self::Test => "run_tests",
            Self::Review => "review_code",
            Self::Deploy => "deploy_code",
            Self::Research => "research",
            Self::Security => "security_audit",
            Self::Other => "general_work",
        }
    }
}

impl Default for StepType {
    fn default() -> Self {
        Self::Other
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: Uuid,
    pub mission_id: Uuid,
    pub order_index: i32,
    pub title: String,
    pub description: String,
    pub step_type: StepType,
    pub status: StepStatus,
    pub claimed_by_agent_id: Option<Uuid>,
    pub output: Option<String>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Step {
    #[must_use]
    pub fn new(
        mission_id: Uuid,
        order_index: i32,
        title: impl Into<String>,
        description: impl Into<String>,
        step_type: StepType,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            mission_id,
            order_index,
            title: title.into(),
            description: description.into(),
            step_type,
            status: StepStatus::Pending,
            claimed_by_agent_id: None,
            output: None,
            error: None,
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    /// Apply the default 4-step plan used by mission materialization
    /// (spec §4.1 phase 5): RESEARCH/0, CODE/1, TEST/2, REVIEW/3.
    #[must_use]
    pub fn default_plan(mission_id: Uuid, mission_title: &str) -> Vec<Self> {
        vec![
            Self::new(
                mission_id,
                0,
                "Research and Planning",
                format!("Research and plan the implementation of: {mission_title}"),
                StepType::Research,
            ),
            Self::new(
                mission_id,
                1,
                "Implementation",
                format!("Implement the solution for: {mission_title}"),
                StepType::Code,
            ),
            Self::new(
                mission_id,
                2,
                "Testing",
                format!("Test the implementation of: {mission_title}"),
                StepType::Test,
            ),
            Self::new(
                mission_id,
                3,
                "Review",
                format!("Review and validate: {mission_title}"),
                StepType::Review,
            ),
        ]
    }

    /// Attempt a state transition, enforcing I2. Returns the rejected
    /// target on failure so callers can build a conflict error.
    pub fn transition_to(&mut self, target: StepStatus) -> Result<(), StepStatus> {
        if !self.status.can_transition_to(target) {
            return Err(target);
        }
        self.status = target;
        Ok(())
    }
}
