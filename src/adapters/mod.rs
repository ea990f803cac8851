//! Adapters: concrete implementations of `domain::ports` traits.

pub mod board;
pub mod dispatchers;
pub mod sqlite;
