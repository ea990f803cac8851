mod audit;
mod logger;
mod secret_scrubbing;

pub use audit::{AuditEventType, AuditLog, AuditOutcome};
pub use logger::LoggerHandle;
pub use secret_scrubbing::SecretScrubber;
