//! Dispatch adapters — how a claimed step's prompt is actually executed.

pub mod chat_completion;
pub mod cli_subprocess;
pub mod registry;

pub use chat_completion::{ChatCompletionDispatcher, ChatDispatcherConfig};
pub use cli_subprocess::{CliSubprocessConfig, CliSubprocessDispatcher};
pub use registry::DispatcherRegistry;
