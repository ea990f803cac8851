//! Hierarchical config loading (spec §6 "Configuration").
//!
//! Precedence, lowest to highest: programmatic defaults, project config
//! (`.agentloop/config.yaml`), local overrides (`.agentloop/local.yaml`),
//! environment variables (`AGENTLOOP_` prefix, `__` nested separator).

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use super::types::AppConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("api_port cannot be 0")]
    InvalidApiPort,

    #[error("agent_work_interval_seconds cannot be 0")]
    InvalidAgentWorkInterval,

    #[error("orchestrator_tick_interval_seconds cannot be 0")]
    InvalidTickInterval,

    #[error("step_timeout_seconds cannot be 0")]
    InvalidStepTimeout,

    #[error("store_url cannot be empty")]
    EmptyStoreUrl,

    #[error("invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load() -> Result<AppConfig> {
        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(".agentloop/config.yaml"))
            .merge(Yaml::file(".agentloop/local.yaml"))
            .merge(Env::prefixed("AGENTLOOP_").split("__"))
            .extract()
            .context("failed to extract configuration")?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<AppConfig> {
        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &AppConfig) -> Result<(), ConfigError> {
        if config.api_port == 0 {
            return Err(ConfigError::InvalidApiPort);
        }
        if config.agent_work_interval_seconds == 0 {
            return Err(ConfigError::InvalidAgentWorkInterval);
        }
        if config.orchestrator_tick_interval_seconds == 0 {
            return Err(ConfigError::InvalidTickInterval);
        }
        if config.step_timeout_seconds == 0 {
            return Err(ConfigError::InvalidStepTimeout);
        }
        if config.store_url.is_empty() {
            return Err(ConfigError::EmptyStoreUrl);
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        ConfigLoader::validate(&config).expect("default config should be valid");
    }

    #[test]
    fn rejects_zero_tick_interval() {
        let mut config = AppConfig::default();
        config.orchestrator_tick_interval_seconds = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidTickInterval)));
    }

    #[test]
    fn rejects_invalid_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidLogLevel(_))));
    }

    #[test]
    fn yaml_override_wins_over_defaults() {
        let yaml = "orchestrator_tick_interval_seconds: 60\nlogging:\n  level: debug\n";
        let config: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(figment::providers::Yaml::string(yaml))
            .extract()
            .unwrap();
        assert_eq!(config.orchestrator_tick_interval_seconds, 60);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty", "untouched field keeps its default");
    }
}
