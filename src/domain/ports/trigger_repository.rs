//! Trigger repository port.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Trigger;

#[async_trait]
pub trait TriggerRepository: Send + Sync {
    async fn create(&self, trigger: &Trigger) -> DomainResult<()>;
    async fn get(&self, id: Uuid) -> DomainResult<Option<Trigger>>;
    async fn get_by_name(&self, project_id: Uuid, name: &str) -> DomainResult<Option<Trigger>>;
    async fn update(&self, trigger: &Trigger) -> DomainResult<()>;
    async fn delete(&self, id: Uuid) -> DomainResult<()>;
    async fn list(&self, project_id: Uuid) -> DomainResult<Vec<Trigger>>;

    /// Enabled triggers across all projects, in creation order (spec §4.3
    /// "triggers are evaluated in creation order").
    async fn list_enabled(&self) -> DomainResult<Vec<Trigger>>;
}
