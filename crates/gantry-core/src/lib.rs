//! Gantry Core
//!
//! Domain types, collaborator traits, and error handling shared by the
//! Gantry crates: materials and their fingerprints, revisions and
//! modifications, the pipeline timeline, and pipeline configuration.

pub mod error;
pub mod ids;
pub mod material;
pub mod pipeline;
pub mod ports;
pub mod revision;
pub mod timeline;

pub use error::{Error, Result};
pub use ids::*;
pub use material::{DependencyMaterialConfig, Fingerprint, MaterialConfig, ScmKind, ScmMaterialConfig};
pub use revision::{MaterialRevision, MaterialRevisions, Modification, Revision};
