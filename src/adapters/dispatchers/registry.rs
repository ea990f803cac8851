//! DispatcherRegistry — the single swappable sink `WorkerEngine` dispatches
//! claimed steps through, chosen once at startup from `DispatcherConfig`
//! (spec §2 "Dispatcher registry").
//!
//! A plugin that wants to replace the active dispatcher provides its own
//! `ConfiguredDispatcher` variant's inner type rather than mutating this
//! enum at runtime — there is exactly one active sink per process, matching
//! the single-`WorkerEngine` deployment model (spec §4.4).

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::AgentConfig;
use crate::domain::ports::dispatcher::{ChatDispatcher, DispatchOutcome, StepDispatcher};

use super::{ChatCompletionDispatcher, CliSubprocessDispatcher};

pub enum DispatcherRegistry {
    Chat(ChatCompletionDispatcher),
    CliSubprocess(CliSubprocessDispatcher),
}

#[async_trait]
impl StepDispatcher for DispatcherRegistry {
    async fn dispatch(
        &self,
        step_id: Uuid,
        prompt: &str,
        timeout: Duration,
        agent_config: Option<&AgentConfig>,
    ) -> DomainResult<DispatchOutcome> {
        match self {
            Self::Chat(d) => d.dispatch(step_id, prompt, timeout, agent_config).await,
            Self::CliSubprocess(d) => d.dispatch(step_id, prompt, timeout, agent_config).await,
        }
    }
}

#[async_trait]
impl ChatDispatcher for DispatcherRegistry {
    async fn send(&self, prompt: &str, agent_config: Option<&AgentConfig>) -> DomainResult<String> {
        match self {
            Self::Chat(d) => d.send(prompt, agent_config).await,
            Self::CliSubprocess(_) => {
                Err(DomainError::Dispatcher("configured dispatcher does not support chat".to_string()))
            }
        }
    }

    async fn available(&self) -> bool {
        match self {
            Self::Chat(d) => d.available().await,
            Self::CliSubprocess(_) => true,
        }
    }
}
