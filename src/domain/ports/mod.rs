//! Port traits (hexagonal "driven" side): everything the services depend on
//! as a trait object so adapters stay swappable and mockable in tests.

pub mod agent_repository;
pub mod board;
pub mod dispatcher;
pub mod event_repository;
pub mod hook;
pub mod mission_repository;
pub mod project_context_repository;
pub mod project_repository;
pub mod proposal_repository;
pub mod step_repository;
pub mod trigger_repository;

pub use agent_repository::{AgentFilter, AgentRepository};
pub use board::{BoardClient, BoardSummary, BoardTask};
pub use dispatcher::{ChatDispatcher, DispatchOutcome, DispatchStatus, StepDispatcher};
pub use event_repository::EventRepository;
pub use hook::{HookBus, HookContext, HookDecision, HookHandler, HookPoint};
pub use mission_repository::{MissionFilter, MissionRepository};
pub use project_context_repository::ProjectContextRepository;
pub use project_repository::{ProjectFilter, ProjectRepository};
pub use proposal_repository::{ProposalFilter, ProposalRepository};
pub use step_repository::{StepFilter, StepRepository};
pub use trigger_repository::TriggerRepository;
