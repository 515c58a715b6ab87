//! History store errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Pipeline '{0}' has no stages to run")]
    NoStages(String),

    #[error("Pipeline '{0}' is not configured")]
    UnknownPipeline(String),

    #[error("Pipeline '{pipeline}' has {expected} materials but {actual} revisions were given")]
    RevisionCountMismatch {
        pipeline: String,
        expected: usize,
        actual: usize,
    },

    #[error("No revision '{revision}' recorded for {material}")]
    UnknownRevision { material: String, revision: String },

    #[error("Invalid stage locator: {0}")]
    InvalidStageLocator(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse history snapshot: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, HistoryError>;

impl From<HistoryError> for gantry_core::Error {
    fn from(err: HistoryError) -> Self {
        gantry_core::Error::History(err.to_string())
    }
}
