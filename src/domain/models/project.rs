//! Project domain model — the top-level scope agents and work are bound to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    Paused,
    Decommissioned,
}

impl ProjectStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Decommissioned => "decommissioned",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "paused" => Some(Self::Paused),
            "decommissioned" => Some(Self::Decommissioned),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    /// Stable external handle; unique across projects.
    pub slug: String,
    pub description: String,
    pub repo_path: Option<String>,
    pub status: ProjectStatus,
    pub config: Value,
    pub created_at: DateTime<Utc>,
}

impl Project {
    #[must_use]
    pub fn new(name: impl Into<String>, slug: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            slug: slug.into(),
            description: description.into(),
            repo_path: None,
            status: ProjectStatus::Active,
            config: Value::Object(serde_json::Map::new()),
            created_at: Utc::now(),
        }
    }
}
