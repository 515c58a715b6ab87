//! In-memory pipeline history for Gantry.
//!
//! [`MemoryHistory`] records material check-ins and pipeline runs and
//! answers the timeline, stage and modification lookups the revision
//! resolver needs. Histories can be built in code or replayed from a
//! [`HistorySnapshot`].

pub mod error;
pub mod repositories;
pub mod snapshot;
pub mod store;

pub use error::HistoryError;
pub use snapshot::{HistoryEvent, HistorySnapshot};
pub use store::{MemoryHistory, PipelineRun, StageResult, StageRun};
