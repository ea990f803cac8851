//! Project repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Project, ProjectStatus};

#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
}

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn create(&self, project: &Project) -> DomainResult<()>;
    async fn get(&self, id: Uuid) -> DomainResult<Option<Project>>;
    async fn get_by_slug(&self, slug: &str) -> DomainResult<Option<Project>>;
    async fn update(&self, project: &Project) -> DomainResult<()>;
    async fn list(&self, filter: ProjectFilter) -> DomainResult<Vec<Project>>;
}
