//! Domain models for the orchestration engine's entity graph.
//!
//! Entities are plain structs keyed by time-sortable UUIDv7s, persisted as
//! rows by the `adapters::sqlite` repositories behind `domain::ports`
//! traits. There are no in-memory back-references between entities
//! (Agent -> Project, Step -> Mission, ...) — aggregate loads go through
//! explicit repository queries instead of object graphs.

mod agent;
mod event;
mod mission;
mod project;
mod project_context;
mod proposal;
mod step;
mod trigger;

pub use agent::{Agent, AgentConfig, AgentPose, AgentStatus};
pub use event::Event;
pub use mission::{Mission, MissionStatus};
pub use project::{Project, ProjectStatus};
pub use project_context::ProjectContext;
pub use proposal::{Proposal, ProposalPriority, ProposalStatus};
pub use step::{Step, StepStatus, StepType};
pub use trigger::{EventPattern, Trigger, TriggerAction};
