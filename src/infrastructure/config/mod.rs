mod loader;
mod types;

pub use loader::{ConfigError, ConfigLoader};
pub use types::{AppConfig, BoardConfig, DispatcherConfig, LoggingConfig};
