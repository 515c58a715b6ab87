//! Fan-in revision resolution.
//!
//! When a pipeline reaches the same source repository through more than one
//! upstream pipeline, every path has to be built from the same revision of
//! that repository. The [`FanInGraph`] finds the newest upstream instances
//! that agree, backtracking through history up to a configured limit.

mod context;
mod error;
mod graph;
mod node;
mod resolver;
mod revision;

pub use context::ResolutionSources;
pub use error::{FaninError, Result};
pub use graph::FanInGraph;
pub use node::{DependencyNode, FanInNode, ScmNode};
pub use resolver::{NodeResolver, RevisionAlteration};
pub use revision::{FaninScmMaterial, ScmRevisionSet, StageScmRevision};
