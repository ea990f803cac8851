//! Event repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::Event;

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Append-only (I6): events are never updated via this port.
    async fn append(&self, event: &Event) -> DomainResult<()>;

    async fn list_since(&self, project_id: Uuid, since: DateTime<Utc>) -> DomainResult<Vec<Event>>;

    /// Deletes events older than `cutoff`; returns the number deleted
    /// (retention phase, spec §4.1.8).
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> DomainResult<u64>;
}
