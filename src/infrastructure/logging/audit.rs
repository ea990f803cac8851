//! Append-only JSON-lines audit trail for security-relevant operations
//! (spec §1 "Ambient stack — Logging"): proposal approval/rejection, mission
//! escalation, step dispatch, config load.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    ProposalApproved,
    ProposalRejected,
    MissionEscalated,
    StepDispatched,
    ConfigLoaded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: AuditEventType,
    pub operation: String,
    pub actor: String,
    pub resource_id: Option<String>,
    pub outcome: AuditOutcome,
    pub metadata: Option<Value>,
}

#[derive(Clone)]
pub struct AuditLog {
    file: Arc<Mutex<std::fs::File>>,
}

impl AuditLog {
    pub fn open(log_path: impl AsRef<Path>) -> Result<Self> {
        let log_path = log_path.as_ref();
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create audit log directory")?;
        }
        let file = OpenOptions::new().create(true).append(true).open(log_path).context("failed to open audit log")?;
        Ok(Self { file: Arc::new(Mutex::new(file)) })
    }

    pub fn record(
        &self,
        event_type: AuditEventType,
        operation: &str,
        actor: &str,
        resource_id: Option<&str>,
        outcome: AuditOutcome,
        metadata: Option<Value>,
    ) -> Result<()> {
        let event = AuditEvent {
            timestamp: Utc::now(),
            event_type,
            operation: operation.to_string(),
            actor: actor.to_string(),
            resource_id: resource_id.map(String::from),
            outcome,
            metadata,
        };

        let json = serde_json::to_string(&event).context("failed to serialize audit event")?;
        {
            let mut file = self.file.lock().map_err(|e| anyhow::anyhow!("audit log mutex poisoned: {e}"))?;
            writeln!(file, "{json}").context("failed to write audit event")?;
            file.flush().context("failed to flush audit log")?;
        }

        tracing::info!(
            event_type = ?event.event_type,
            operation = %event.operation,
            actor = %event.actor,
            resource_id = ?event.resource_id,
            outcome = ?event.outcome,
            "audit event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn appends_one_line_per_event() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let log = AuditLog::open(&path).unwrap();

        log.record(AuditEventType::ProposalApproved, "approve_proposal", "system", Some("prop-1"), AuditOutcome::Success, None)
            .unwrap();
        log.record(AuditEventType::MissionEscalated, "escalate_mission", "orchestrator", Some("mission-1"), AuditOutcome::Success, None)
            .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("proposal_approved"));
        assert!(contents.contains("mission_escalated"));
    }
}
