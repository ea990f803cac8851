//! ProjectContext domain model — scratch memory used to enrich worker prompts.
//!
//! Unique by `(project_id, category, key)`; not part of the critical path,
//! so repositories upsert on conflict rather than erroring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectContext {
    pub id: Uuid,
    pub project_id: Uuid,
    pub category: String,
    pub key: String,
    pub content: String,
    pub source_agent_id: Option<Uuid>,
    pub source_step_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl ProjectContext {
    #[must_use]
    pub fn new(
        project_id: Uuid,
        category: impl Into<String>,
        key: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            project_id,
            category: category.into(),
            key: key.into(),
            content: content.into(),
            source_agent_id: None,
            source_step_id: None,
            created_at: Utc::now(),
        }
    }
}
