//! Event domain model — the append-only audit log and trigger substrate (I6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub event_type: String,
    pub source_agent_id: Option<Uuid>,
    pub project_id: Uuid,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl Event {
    #[must_use]
    pub fn new(event_type: impl Into<String>, project_id: Uuid, payload: Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_type: event_type.into(),
            source_agent_id: None,
            project_id,
            payload,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_source_agent(mut self, agent_id: Uuid) -> Self {
        self.source_agent_id = Some(agent_id);
        self
    }

    /// Read a string field from the event payload, if present.
    #[must_use]
    pub fn payload_str(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }
}
