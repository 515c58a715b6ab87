//! Collaborators and limits for one resolution call.

use gantry_core::material::{DependencyMaterialConfig, Fingerprint, ScmMaterialConfig};
use gantry_core::ports::{ModificationLookup, PipelineTimeline, StageLookup};
use std::collections::BTreeMap;

/// Read-only history the resolver consults.
#[derive(Clone, Copy)]
pub struct ResolutionSources<'a> {
    pub timeline: &'a dyn PipelineTimeline,
    pub stages: &'a dyn StageLookup,
    pub modifications: &'a dyn ModificationLookup,
}

impl<'a> ResolutionSources<'a> {
    pub fn new(
        timeline: &'a dyn PipelineTimeline,
        stages: &'a dyn StageLookup,
        modifications: &'a dyn ModificationLookup,
    ) -> Self {
        Self {
            timeline,
            stages,
            modifications,
        }
    }

    /// Use one store for all three lookups.
    pub fn from_store<S>(store: &'a S) -> Self
    where
        S: PipelineTimeline + StageLookup + ModificationLookup,
    {
        Self::new(store, store, store)
    }
}

impl std::fmt::Debug for ResolutionSources<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionSources").finish_non_exhaustive()
    }
}

/// Everything a node resolver needs while scanning history.
pub(crate) struct ResolutionContext<'a> {
    pub pipeline: &'a str,
    pub sources: ResolutionSources<'a>,
    pub scm_materials: &'a BTreeMap<Fingerprint, ScmMaterialConfig>,
    pub dependency_materials: &'a BTreeMap<Fingerprint, DependencyMaterialConfig>,
    pub max_back_track_limit: usize,
    pub batch_size: usize,
}

impl ResolutionContext<'_> {
    pub fn is_scm(&self, fingerprint: &Fingerprint) -> bool {
        self.scm_materials.contains_key(fingerprint)
    }

    pub fn is_dependency(&self, fingerprint: &Fingerprint) -> bool {
        self.dependency_materials.contains_key(fingerprint)
    }
}
