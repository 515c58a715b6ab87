//! Error types for Gantry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Configuration errors
    #[error("Pipeline not found: {0}")]
    PipelineNotFound(String),

    #[error("Invalid pipeline configuration: {0}")]
    InvalidPipeline(String),

    #[error("Stage not found: {pipeline}/{stage}")]
    StageNotFound { pipeline: String, stage: String },

    // History errors
    #[error("Invalid stage locator: {0}")]
    InvalidStageLocator(String),

    #[error("Pipeline instance not found: {pipeline}/{counter}")]
    PipelineInstanceNotFound { pipeline: String, counter: u32 },

    #[error("Modification not found for {material} at revision {revision}")]
    ModificationNotFound { material: String, revision: String },

    #[error("Material not found: {0}")]
    MaterialNotFound(String),

    // Infrastructure errors
    #[error("History store error: {0}")]
    History(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
