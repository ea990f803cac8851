//! Board adapter port — the external task board contract (spec §4.6, §6).
//!
//! Grounded on the same ingestion/egress split the plugin adapters used in
//! the donor codebase (`IngestionAdapter`/`EgressAdapter`), collapsed into
//! one `BoardClient` trait since the orchestration core only ever needs one
//! concrete board backend at a time (selected at startup, not per-event).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: String,
    #[serde(default = "default_priority")]
    pub priority: String,
}

fn default_priority() -> String {
    "medium".to_string()
}

/// The board protocol client (spec §6 "Board protocol (bit-exact)").
#[async_trait]
pub trait BoardClient: Send + Sync {
    async fn list_boards(&self) -> DomainResult<Vec<BoardSummary>>;

    async fn list_tasks(&self, board_id: &str, status: Option<&str>) -> DomainResult<Vec<BoardTask>>;

    async fn update_task_status(
        &self,
        board_id: &str,
        task_id: &str,
        status: &str,
        comment: Option<&str>,
    ) -> DomainResult<()>;

    async fn create_task(
        &self,
        board_id: &str,
        title: &str,
        description: &str,
        priority: &str,
    ) -> DomainResult<()>;

    async fn post_comment(&self, board_id: &str, task_id: &str, content: &str) -> DomainResult<()>;

    async fn ask_user(
        &self,
        board_id: &str,
        content: &str,
        correlation_id: Option<&str>,
    ) -> DomainResult<()>;
}
