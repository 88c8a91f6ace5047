//! Ingestion pipeline
//!
//! Buffers ticks from the feed and supervises the connection lifecycle.

mod buffer;
mod supervisor;

pub use buffer::{Batch, EventBuffer};
pub use supervisor::{ConnectionState, IngestStats, IngestionSupervisor};
