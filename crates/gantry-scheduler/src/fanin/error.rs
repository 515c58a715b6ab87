//! Fan-in resolution failures.

use thiserror::Error;

/// Every variant is fatal to the current scheduling attempt. The caller
/// decides whether to try again on its next tick.
#[derive(Debug, Error)]
pub enum FaninError {
    #[error("Pipeline '{0}' not found in configuration")]
    PipelineNotFound(String),

    #[error(
        "Failed resolving dependencies for pipeline '{pipeline}': no compatible upstream revisions for material '{material}'"
    )]
    NoCompatibleUpstreamRevisions { pipeline: String, material: String },

    #[error(
        "Failed resolving dependencies for pipeline '{pipeline}': no compatible upstream revisions, could not find a revision of material '{material}' consistent with the other upstream dependencies"
    )]
    FailedToFindCompatibleRevision { pipeline: String, material: String },

    #[error(
        "Material '{material}' is a direct dependency of pipeline '{pipeline}' but has no revision in the build cause"
    )]
    MissingDirectDependency { pipeline: String, material: String },

    #[error(
        "Maximum back-track limit of {limit} reached while resolving material '{material}' for pipeline '{pipeline}'"
    )]
    MaxBackTrackLimitReached {
        pipeline: String,
        material: String,
        limit: usize,
    },

    #[error(
        "No modifications present for dependency material '{material}' of pipeline '{pipeline}' at stage {stage_locator}; history may be incomplete"
    )]
    NoModificationsPresentForDependentMaterial {
        pipeline: String,
        material: String,
        stage_locator: String,
    },

    #[error("Invalid fan-in configuration: {0}")]
    InvalidConfig(#[from] config::ConfigError),

    #[error(transparent)]
    Lookup(#[from] gantry_core::Error),
}

pub type Result<T> = std::result::Result<T, FaninError>;
