//! Application services — the orchestration core, independent of any
//! concrete adapter.

pub mod approval_engine;
pub mod hook_bus;
pub mod orchestrator;
pub mod plugin_manager;
pub mod plugins;
pub mod trigger_evaluator;
pub mod worker_engine;

pub use approval_engine::{should_auto_approve, ApprovalEngine};
pub use hook_bus::InMemoryHookBus;
pub use orchestrator::{BoardMapping, OrchestrationResult, Orchestrator, OrchestratorConfig};
pub use plugin_manager::{LoadedPlugin, PluginManager, PluginManifest};
pub use plugins::builtin_plugins;
pub use trigger_evaluator::{TriggerEvalSummary, TriggerEvaluator};
pub use worker_engine::{WorkCycleOutcome, WorkerEngine};
