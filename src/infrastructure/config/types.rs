//! The configuration schema (spec §6 "Configuration").

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub board: BoardConfig,
    pub dispatcher: DispatcherConfig,
    pub agent_work_interval_seconds: u64,
    pub orchestrator_tick_interval_seconds: u64,
    pub step_timeout_seconds: u64,
    pub agents_dir: String,
    pub projects_dir: String,
    pub plugins_dir: String,
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_url: "sqlite:.agentloop/agentloop.db".to_string(),
            api_host: "127.0.0.1".to_string(),
            api_port: 8420,
            board: BoardConfig::default(),
            dispatcher: DispatcherConfig::default(),
            agent_work_interval_seconds: 15,
            orchestrator_tick_interval_seconds: 30,
            step_timeout_seconds: 300,
            agents_dir: ".agentloop/agents".to_string(),
            projects_dir: ".agentloop/projects".to_string(),
            plugins_dir: ".agentloop/plugins".to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub base_url: Option<String>,
    /// Always sourced from config/environment; never hardcode a credential
    /// here.
    pub token: Option<String>,
    pub org_id: Option<String>,
    /// `{board_id: project_slug}` — which boards sync into which projects.
    pub map: HashMap<String, String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self { base_url: None, token: None, org_id: None, map: HashMap::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub cli_name: Option<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { base_url: None, model: None, api_key: None, cli_name: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub retention_days: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string(), retention_days: 14 }
    }
}
