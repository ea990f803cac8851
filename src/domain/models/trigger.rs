//! Trigger domain model — declarative `{event_pattern -> action}` rules.
//!
//! Actions are a tagged union (spec §9 "Tagged unions for trigger actions"):
//! unknown tags must fail decode with `InvalidTrigger` rather than being
//! silently ignored, so trigger persistence stores the action as raw JSON
//! and defers the tag decode to `TriggerAction::from_stored`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use super::StepType;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPattern {
    pub event_type: String,
    #[serde(default)]
    pub conditions: HashMap<String, Value>,
}

impl EventPattern {
    #[must_use]
    pub fn matches(&self, event_type: &str, payload: &Value) -> bool {
        if event_type != self.event_type {
            return false;
        }
        self.conditions.iter().all(|(key, expected)| {
            payload.get(key).is_some_and(|actual| actual == expected)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerAction {
    CreateStep {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        description: Option<String>,
        #[serde(default)]
        step_type: Option<String>,
        #[serde(default)]
        order_index: Option<i32>,
    },
    EvaluateMissionCompletion,
}

impl TriggerAction {
    /// Decode a stored `{type, ...}` JSON value, producing `InvalidTrigger`
    /// for unrecognized tags instead of silently dropping the trigger.
    pub fn from_stored(raw: &Value) -> Result<Self, DomainError> {
        let tag = raw
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError::InvalidTrigger("missing 'type' field".to_string()))?;
        match tag {
            "create_step" | "evaluate_mission_completion" => {
                serde_json::from_value(raw.clone())
                    .map_err(|e| DomainError::InvalidTrigger(e.to_string()))
            }
            other => Err(DomainError::InvalidTrigger(other.to_string())),
        }
    }

    #[must_use]
    pub fn step_type_or_default(&self) -> StepType {
        match self {
            Self::CreateStep { step_type, .. } => step_type
                .as_deref()
                .and_then(StepType::from_str)
                .unwrap_or_default(),
            Self::EvaluateMissionCompletion => StepType::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Unique per project.
    pub name: String,
    pub event_pattern: EventPattern,
    pub action: TriggerAction,
    pub enabled: bool,
    pub last_fired_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Trigger {
    #[must_use]
    pub fn new(
        project_id: Uuid,
        name: impl Into<String>,
        event_pattern: EventPattern,
        action: TriggerAction,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            project_id,
            name: name.into(),
            event_pattern,
            action,
            enabled: true,
            last_fired_at: None,
            created_at: Utc::now(),
        }
    }
}
