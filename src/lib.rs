//! AgentLoop — a multi-agent closed-loop orchestration engine: proposals
//! flow in from an external task board, get approved, materialize into
//! missions and steps, and get dispatched to agents until the mission
//! closes or escalates back to a human (spec §1).

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;
