//! `tracing` subscriber setup (spec §1 "Ambient stack — Logging").

use std::io;

use anyhow::Result;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::infrastructure::config::LoggingConfig;

/// Holds the `tracing-appender` worker guard so buffered file writes flush
/// on drop; keep the returned handle alive for the process lifetime.
pub struct LoggerHandle {
    _guard: Option<WorkerGuard>,
}

impl LoggerHandle {
    pub fn init(config: &LoggingConfig, log_dir: Option<&str>) -> Result<Self> {
        let level = parse_log_level(&config.level)?;
        let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();
        let pretty = config.format != "json";

        let guard = if let Some(dir) = log_dir {
            let file_appender = rolling::daily(dir, "agentloop.log");
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let file_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking_file)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .with_filter(env_filter.clone());

            if pretty {
                let stdout_layer = tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(io::stdout)
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_filter(env_filter);
                tracing_subscriber::registry().with(file_layer).with(stdout_layer).init();
            } else {
                let stdout_layer =
                    tracing_subscriber::fmt::layer().json().with_writer(io::stdout).with_target(true).with_filter(env_filter);
                tracing_subscriber::registry().with(file_layer).with(stdout_layer).init();
            }
            Some(guard)
        } else if pretty {
            let stdout_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(io::stdout)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(env_filter);
            tracing_subscriber::registry().with(stdout_layer).init();
            None
        } else {
            let stdout_layer =
                tracing_subscriber::fmt::layer().json().with_writer(io::stdout).with_target(true).with_filter(env_filter);
            tracing_subscriber::registry().with(stdout_layer).init();
            None
        };

        tracing::info!(level = %config.level, format = %config.format, file_output = log_dir.is_some(), "logger initialized");
        Ok(Self { _guard: guard })
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!("invalid log level: {level}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels() {
        assert!(matches!(parse_log_level("info"), Ok(Level::INFO)));
        assert!(matches!(parse_log_level("WARN"), Ok(Level::WARN)));
        assert!(parse_log_level("verbose").is_err());
    }
}
