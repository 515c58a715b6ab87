//! Pipeline timeline entries.

use crate::ids::PipelineInstanceId;
use crate::material::Fingerprint;
use crate::revision::Revision;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One historical instance of a pipeline and the revisions it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineTimelineEntry {
    pub pipeline_name: String,
    pub id: PipelineInstanceId,
    pub counter: u32,
    /// Revisions keyed by material fingerprint. The first revision of each
    /// list is the one the instance was built against.
    pub revisions: BTreeMap<Fingerprint, Vec<Revision>>,
}

impl PipelineTimelineEntry {
    pub fn new(pipeline_name: impl Into<String>, id: PipelineInstanceId, counter: u32) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            id,
            counter,
            revisions: BTreeMap::new(),
        }
    }

    pub fn with_revision(mut self, fingerprint: Fingerprint, revision: Revision) -> Self {
        self.revisions.entry(fingerprint).or_default().push(revision);
        self
    }

    /// The effective revision used for a material.
    pub fn revision_for(&self, fingerprint: &Fingerprint) -> Option<&Revision> {
        self.revisions.get(fingerprint).and_then(|revisions| revisions.first())
    }

    /// Effective revisions in fingerprint order.
    pub fn effective_revisions(&self) -> impl Iterator<Item = (&Fingerprint, &Revision)> {
        self.revisions
            .iter()
            .filter_map(|(fingerprint, revisions)| revisions.first().map(|r| (fingerprint, r)))
    }
}
