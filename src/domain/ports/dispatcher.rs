//! Dispatch ports — how a claimed step's prompt actually gets executed
//! (spec §4.5).

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::errors::DomainResult;
use crate::domain::models::AgentConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub status: DispatchStatus,
    pub text: String,
}

/// Runs a step's generated prompt against whatever executes work on an
/// agent's behalf: a CLI subprocess, a chat-completion model, or (in tests)
/// a canned simulator.
#[async_trait]
pub trait StepDispatcher: Send + Sync {
    async fn dispatch(
        &self,
        step_id: uuid::Uuid,
        prompt: &str,
        timeout: Duration,
        agent_config: Option<&AgentConfig>,
    ) -> DomainResult<DispatchOutcome>;
}

/// A narrower, conversational dispatch contract used by chat-completion
/// backed agents and by interactive CLI flows (spec §4.5 "Chat dispatch").
#[async_trait]
pub trait ChatDispatcher: Send + Sync {
    async fn send(&self, prompt: &str, agent_config: Option<&AgentConfig>) -> DomainResult<String>;

    /// Whether this dispatcher's backend is currently reachable, without
    /// spending a full completion (used by startup health checks).
    async fn available(&self) -> bool;
}
