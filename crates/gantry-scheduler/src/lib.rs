//! Dependency revision resolution for Gantry.
//!
//! Given a pipeline whose upstream dependencies share source repositories,
//! [`fanin::FanInGraph`] picks the upstream revisions that agree on a single
//! source state. [`dependencies::DependencyResolver`] wraps it as the service
//! the scheduler calls before queuing a run.

pub mod config;
pub mod dag;
pub mod dependencies;
pub mod fanin;

pub use config::FaninConfig;
pub use dependencies::DependencyResolver;
pub use fanin::{FanInGraph, FaninError, ResolutionSources};
