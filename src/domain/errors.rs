//! Domain errors for the orchestration engine.

use thiserror::Error;
use uuid::Uuid;

/// The single error type threaded through ports and services via `?`.
///
/// Variants are partitioned along the taxonomy the engine's error-handling
/// design calls for: transport failures, dispatcher-reported failures,
/// invariant conflicts at a state-transition boundary, configuration
/// problems, and a catch-all for store/serialization failures.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("project not found: {0}")]
    ProjectNotFound(Uuid),

    #[error("agent not found: {0}")]
    AgentNotFound(Uuid),

    #[error("proposal not found: {0}")]
    ProposalNotFound(Uuid),

    #[error("mission not found: {0}")]
    MissionNotFound(Uuid),

    #[error("step not found: {0}")]
    StepNotFound(Uuid),

    #[error("trigger not found: {0}")]
    TriggerNotFound(Uuid),

    #[error("duplicate mc_task_id: {0}")]
    DuplicateTaskId(String),

    #[error("duplicate trigger name '{name}' in project {project_id}")]
    DuplicateTriggerName { name: String, project_id: Uuid },

    #[error("conflict on {entity} {id}: {reason}")]
    Conflict {
        entity: &'static str,
        id: Uuid,
        reason: &'static str,
    },

    #[error("invalid trigger action tag: {0}")]
    InvalidTrigger(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("dispatcher error: {0}")]
    Dispatcher(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl DomainError {
    /// `true` for errors the tick loop should just log and move past rather
    /// than treat as a hard stop for the phase that produced them.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Dispatcher(_))
    }
}
