//! Hook bus port (spec §4.7) — lets plugins observe and veto orchestrator
//! phases without the orchestrator knowing any plugin exists.
//!
//! Grounded on the donor codebase's `HookEvent`/`HookCondition`/`HookAction`
//! trio, renamed to the phases this orchestrator actually has.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::errors::DomainResult;

/// Points in the tick where registered handlers run (spec §4.1 phase list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPoint {
    OnTickSync,
    OnProposalApproved,
    OnMissionCreated,
    OnStepDispatched,
    OnMissionComplete,
    OnStuckCheck,
}

#[derive(Debug, Clone, Default)]
pub struct HookContext {
    pub project_id: Option<Uuid>,
    pub entity_id: Option<Uuid>,
    pub data: HashMap<String, Value>,
}

impl HookContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, project_id: Uuid, entity_id: Uuid) -> Self {
        self.project_id = Some(project_id);
        self.entity_id = Some(entity_id);
        self
    }
}

/// A decision a handler can return: let the phase proceed, or block it with
/// a reason (mirrors the donor's `BlockTransition` hook action).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookDecision {
    Proceed,
    Block(String),
}

#[async_trait]
pub trait HookHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(&self, point: HookPoint, ctx: &HookContext) -> DomainResult<HookDecision>;
}

#[async_trait]
pub trait HookBus: Send + Sync {
    fn register(&mut self, point: HookPoint, handler: std::sync::Arc<dyn HookHandler>);

    /// Runs every handler registered for `point` in registration order;
    /// the first `Block` short-circuits the rest (spec §4.7).
    async fn fire(&self, point: HookPoint, ctx: &HookContext) -> DomainResult<HookDecision>;
}
