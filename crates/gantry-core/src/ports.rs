//! Port traits (hexagonal architecture).
//!
//! These traits define the read-only collaborators the revision resolver
//! consults. Implementations must be safe to share between threads; the
//! resolver never mutates them.

use crate::ids::{PipelineInstanceId, StageIdentifier};
use crate::material::MaterialConfig;
use crate::revision::{MaterialRevisions, Modification, Revision};
use crate::timeline::PipelineTimelineEntry;
use crate::Result;

/// Ordered history of pipeline instances.
pub trait PipelineTimeline: Send + Sync {
    /// Number of known instances of a pipeline.
    fn instance_count(&self, pipeline: &str) -> Result<usize>;

    /// Instance at a position in the timeline. Index 0 is the oldest instance.
    fn instance_for(&self, pipeline: &str, index: usize) -> Result<Option<PipelineTimelineEntry>>;

    /// Instance with a given pipeline counter.
    fn entry_for(&self, pipeline: &str, counter: u32) -> Result<Option<PipelineTimelineEntry>>;
}

/// Stage run lookups.
pub trait StageLookup: Send + Sync {
    /// Latest passed run of a stage within a pipeline instance.
    fn latest_passed_stage_identifier(
        &self,
        instance: PipelineInstanceId,
        stage_name: &str,
    ) -> Result<Option<StageIdentifier>>;
}

/// Recorded material modifications.
pub trait ModificationLookup: Send + Sync {
    /// Modifications recorded for a dependency material at a stage run.
    fn modifications_for(&self, stage: &StageIdentifier) -> Result<Vec<Modification>>;

    /// Modifications newer than `from`, up to and including `until` when
    /// given. Newest first.
    fn modifications_since(
        &self,
        material: &MaterialConfig,
        from: &Revision,
        until: Option<&Revision>,
    ) -> Result<Vec<Modification>>;

    /// The modification carrying an exact revision string.
    fn modification_at(&self, material: &MaterialConfig, revision: &str)
    -> Result<Option<Modification>>;

    /// Latest known modification of each material. Materials without any
    /// recorded modification are left out.
    fn latest_modifications(&self, materials: &[MaterialConfig]) -> Result<MaterialRevisions>;
}
