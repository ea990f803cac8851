//! ProjectContext repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::ProjectContext;

#[async_trait]
pub trait ProjectContextRepository: Send + Sync {
    /// Upsert on `(project_id, category, key)` conflict, replacing content
    /// and source refs.
    async fn upsert(&self, context: &ProjectContext) -> DomainResult<()>;

    /// Most recent entries for a project, newest first, capped at `limit`
    /// (used by the worker prompt template, spec §4.4 step 3).
    async fn list_recent(&self, project_id: Uuid, limit: i64) -> DomainResult<Vec<ProjectContext>>;
}
