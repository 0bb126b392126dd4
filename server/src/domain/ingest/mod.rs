//! Telemetry ingestion
//!
//! - `pipeline` - Detached persistence of an accepted collection batch
//!
//! A batch reaches this module only after every record in it has passed
//! validation; from here on failures are logged, never reported.

mod pipeline;

pub use pipeline::IngestPipeline;

use crate::data::types::{EventRow, SessionRow, TraceRow};

/// Validated collection batch, already scoped to the caller's application
#[derive(Debug, Clone, Default)]
pub struct CollectionBatch {
    pub session: Option<SessionRow>,
    pub events: Vec<EventRow>,
    pub traces: Vec<TraceRow>,
}

impl CollectionBatch {
    /// Number of records the pipeline will try to persist
    pub fn len(&self) -> usize {
        usize::from(self.session.is_some()) + self.events.len() + self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
