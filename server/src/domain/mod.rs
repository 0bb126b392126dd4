//! Domain logic
//!
//! - `ingest` - Background persistence of telemetry collection batches

pub mod ingest;

pub use ingest::{CollectionBatch, IngestPipeline};
