//! Board adapters: HTTP client and SSE stream ingestion.

pub mod client;
pub mod stream;

pub use client::{BoardHttpConfig, HttpBoardClient};
pub use stream::{BoardStreamFrame, StreamIngestor};
