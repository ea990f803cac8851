//! Built-in plugins (spec §4.7): compiled `HookHandler` builders registered
//! through `PluginManager` at startup, not dynamically loaded modules.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::ports::hook::{HookContext, HookDecision, HookHandler, HookPoint};
use crate::infrastructure::logging::{AuditEventType, AuditLog, AuditOutcome};

use super::plugin_manager::{LoadedPlugin, PluginManifest};

/// Appends an audit record whenever a mission gets escalated to a human.
/// Never blocks the phase — auditing has no say over orchestration.
pub struct AuditHookHandler {
    audit: AuditLog,
}

impl AuditHookHandler {
    #[must_use]
    pub fn new(audit: AuditLog) -> Self {
        Self { audit }
    }
}

#[async_trait]
impl HookHandler for AuditHookHandler {
    fn name(&self) -> &str {
        "audit-log"
    }

    async fn handle(&self, point: HookPoint, ctx: &HookContext) -> DomainResult<HookDecision> {
        if point == HookPoint::OnStuckCheck {
            let resource_id = ctx.entity_id.map(|id| id.to_string());
            if let Err(e) = self.audit.record(
                AuditEventType::MissionEscalated,
                "escalate_stuck_mission",
                "orchestrator",
                resource_id.as_deref(),
                AuditOutcome::Success,
                None,
            ) {
                tracing::warn!(error = %e, "failed to write audit record for stuck mission");
            }
        }
        Ok(HookDecision::Proceed)
    }
}

/// The plugins registered by default at `agentloop serve` startup.
#[must_use]
pub fn builtin_plugins(audit: AuditLog) -> Vec<LoadedPlugin> {
    vec![LoadedPlugin::new(PluginManifest::new("audit-log", "1.0"))
        .with_hook(HookPoint::OnStuckCheck, Arc::new(AuditHookHandler::new(audit)))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::hook::HookBus;
    use crate::services::hook_bus::InMemoryHookBus;
    use crate::services::plugin_manager::PluginManager;
    use tempfile::tempdir;

    #[tokio::test]
    async fn audit_plugin_registers_and_fires_on_stuck_check() {
        let dir = tempdir().expect("tempdir");
        let audit_path = dir.path().join("audit.jsonl");
        let audit = AuditLog::open(&audit_path).expect("open audit log");

        let manager = PluginManager::new(builtin_plugins(audit));
        let mut bus = InMemoryHookBus::new();
        manager.register_all(&mut bus);

        let decision = bus.fire(HookPoint::OnStuckCheck, &HookContext::new()).await.unwrap();
        assert_eq!(decision, HookDecision::Proceed);

        let contents = std::fs::read_to_string(&audit_path).expect("read audit log");
        assert!(contents.contains("mission_escalated"));
    }
}
