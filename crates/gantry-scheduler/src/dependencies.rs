//! Build cause revisions adjusted for upstream dependencies.

use crate::config::FaninConfig;
use crate::fanin::{FanInGraph, ResolutionSources, Result};

use gantry_core::pipeline::PipelineConfigs;
use gantry_core::ports::{ModificationLookup, PipelineTimeline, StageLookup};
use gantry_core::revision::MaterialRevisions;
use std::sync::Arc;
use tracing::debug;

/// The service the scheduler asks for the revisions of a new pipeline run.
#[derive(Clone)]
pub struct DependencyResolver {
    timeline: Arc<dyn PipelineTimeline>,
    stages: Arc<dyn StageLookup>,
    modifications: Arc<dyn ModificationLookup>,
    config: FaninConfig,
}

impl DependencyResolver {
    pub fn new(
        timeline: Arc<dyn PipelineTimeline>,
        stages: Arc<dyn StageLookup>,
        modifications: Arc<dyn ModificationLookup>,
        config: FaninConfig,
    ) -> Self {
        Self {
            timeline,
            stages,
            modifications,
            config,
        }
    }

    /// Use one history store for every lookup.
    pub fn from_store<S>(store: Arc<S>, config: FaninConfig) -> Self
    where
        S: PipelineTimeline + StageLookup + ModificationLookup + 'static,
    {
        Self::new(store.clone(), store.clone(), store, config)
    }

    pub fn config(&self) -> &FaninConfig {
        &self.config
    }

    fn sources(&self) -> ResolutionSources<'_> {
        ResolutionSources::new(
            self.timeline.as_ref(),
            self.stages.as_ref(),
            self.modifications.as_ref(),
        )
    }

    /// Revisions to build `pipeline` from, given the revisions the caller
    /// already found for its direct materials.
    pub fn revisions_based_on_dependencies(
        &self,
        given: &MaterialRevisions,
        configs: &PipelineConfigs,
        pipeline: &str,
    ) -> Result<MaterialRevisions> {
        if !self.config.resolve_fanin_revisions {
            debug!(pipeline, "Fan-in resolution disabled, using given revisions");
            return Ok(given.clone());
        }
        let graph = FanInGraph::build(configs, pipeline)?;
        graph.compute_revisions(given, self.sources(), &self.config)
    }

    /// Reconciled upstream revisions for display, without a build cause.
    pub fn revisions_for_reporting(
        &self,
        configs: &PipelineConfigs,
        pipeline: &str,
    ) -> Result<Option<MaterialRevisions>> {
        let graph = FanInGraph::build(configs, pipeline)?;
        graph.compute_revisions_for_reporting(self.sources(), &self.config)
    }
}

impl std::fmt::Debug for DependencyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyResolver")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
