//! Revision window of one upstream dependency.
//!
//! A [`NodeResolver`] walks the history of the upstream pipeline behind a
//! dependency material, newest instance first, and keeps the instances whose
//! source revisions are internally consistent and match the configured
//! materials. Reconciliation then moves the pinned instance towards older
//! history until every upstream agrees.

use super::context::ResolutionContext;
use super::error::{FaninError, Result};
use super::revision::{FaninScmMaterial, ScmRevisionSet, StageScmRevision};
use gantry_core::ids::StageIdentifier;
use gantry_core::material::{DependencyMaterialConfig, Fingerprint, MaterialConfig};
use gantry_core::revision::Revision;
use gantry_core::timeline::PipelineTimelineEntry;
use std::collections::{BTreeSet, VecDeque};
use tracing::debug;

/// Outcome of asking a node to move to a target revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionAlteration {
    /// The node does not reach the target's material.
    NotApplicable,
    SameAsCurrentRevision,
    AlteredToCorrectRevision,
    /// Every loaded instance was checked; load more history and ask again.
    NeedMoreRevisions,
    /// No instance left in history is old enough.
    AllOptionsExhausted,
}

#[derive(Debug)]
pub struct NodeResolver {
    material: DependencyMaterialConfig,
    reachable_scm: BTreeSet<Fingerprint>,
    total_instance_count: usize,
    current_count: usize,
    /// Accepted instances, most recent first.
    accepted: Vec<(StageIdentifier, ScmRevisionSet)>,
    current: usize,
}

impl NodeResolver {
    pub fn new(material: DependencyMaterialConfig, reachable_scm: BTreeSet<Fingerprint>) -> Self {
        Self {
            material,
            reachable_scm,
            total_instance_count: 0,
            current_count: 0,
            accepted: Vec::new(),
            current: 0,
        }
    }

    pub fn material(&self) -> &DependencyMaterialConfig {
        &self.material
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.material.fingerprint()
    }

    /// Number of historical instances examined so far.
    pub fn examined(&self) -> usize {
        self.current_count
    }

    pub fn has_more_instances(&self) -> bool {
        self.current_count < self.total_instance_count
    }

    /// The pinned instance and its source revisions.
    pub fn current_revision(&self) -> Option<(&StageIdentifier, &ScmRevisionSet)> {
        self.accepted.get(self.current).map(|(stage, scm)| (stage, scm))
    }

    /// Pinned source revisions paired with the pinned stage.
    pub fn current_pairs(&self) -> Vec<StageScmRevision> {
        match self.current_revision() {
            Some((stage, scm)) => scm
                .iter()
                .map(|material| StageScmRevision::new(stage.clone(), material.clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    pub(crate) fn initialize(&mut self, ctx: &ResolutionContext<'_>) -> Result<()> {
        self.total_instance_count = ctx.sources.timeline.instance_count(&self.material.pipeline)?;
        self.current_count = 0;
        self.accepted.clear();
        self.current = 0;
        Ok(())
    }

    /// Scan history until an instance is accepted, then pin the newest one.
    pub(crate) fn populate_revisions(&mut self, ctx: &ResolutionContext<'_>) -> Result<()> {
        self.initialize(ctx)?;
        while self.accepted.is_empty() && self.has_more_instances() {
            self.fill_next_revisions(ctx)?;
        }
        if self.accepted.is_empty() {
            return Err(FaninError::NoCompatibleUpstreamRevisions {
                pipeline: ctx.pipeline.to_string(),
                material: self.describe(),
            });
        }
        self.current = 0;
        Ok(())
    }

    /// Examine up to one batch of not yet examined instances, newest first.
    pub(crate) fn fill_next_revisions(&mut self, ctx: &ResolutionContext<'_>) -> Result<()> {
        for _ in 0..ctx.batch_size {
            if !self.has_more_instances() {
                break;
            }
            self.current_count += 1;
            if self.current_count > ctx.max_back_track_limit {
                return Err(FaninError::MaxBackTrackLimitReached {
                    pipeline: ctx.pipeline.to_string(),
                    material: self.describe(),
                    limit: ctx.max_back_track_limit,
                });
            }

            let index = self.total_instance_count - self.current_count;
            let Some(entry) = ctx.sources.timeline.instance_for(&self.material.pipeline, index)? else {
                debug!(pipeline = %self.material.pipeline, index, "No timeline entry at index");
                continue;
            };
            let Some(stage) = ctx
                .sources
                .stages
                .latest_passed_stage_identifier(entry.id, &self.material.stage)?
            else {
                debug!(
                    pipeline = %self.material.pipeline,
                    counter = entry.counter,
                    stage = %self.material.stage,
                    "Skipping instance without a passed stage"
                );
                continue;
            };
            let Some(scm) = self.scm_revisions_of(&entry, ctx)? else {
                debug!(stage = %stage, "Skipping instance built from conflicting revisions");
                continue;
            };

            let found: BTreeSet<Fingerprint> = scm.iter().map(|m| m.fingerprint.clone()).collect();
            if found != self.reachable_scm {
                debug!(
                    stage = %stage,
                    configured = self.reachable_scm.len(),
                    found = found.len(),
                    "Materials of instance differ from configuration, ignoring older history"
                );
                self.total_instance_count = self.current_count;
                break;
            }

            self.accepted.push((stage, scm));
        }
        Ok(())
    }

    /// Move the pinned instance to the newest accepted one whose revision of
    /// the target material is at or before the target revision.
    pub(crate) fn set_revision_to(&mut self, target: &StageScmRevision) -> RevisionAlteration {
        let applicable = self
            .current_revision()
            .is_some_and(|(_, scm)| scm.get(target.fingerprint()).is_some());
        if !applicable {
            return RevisionAlteration::NotApplicable;
        }

        let position = self
            .accepted
            .iter()
            .enumerate()
            .skip(self.current)
            .find(|(_, (_, scm))| {
                scm.get(target.fingerprint()).is_some_and(|m| &m.revision <= target.revision())
            })
            .map(|(index, _)| index);

        match position {
            Some(index) if index == self.current => RevisionAlteration::SameAsCurrentRevision,
            Some(index) => {
                debug!(
                    material = %self.material.pipeline,
                    from = ?self.current_revision().map(|(stage, _)| stage.stage_locator()),
                    to = %self.accepted[index].0,
                    "Moving to older upstream instance"
                );
                self.current = index;
                RevisionAlteration::AlteredToCorrectRevision
            }
            None if self.has_more_instances() => RevisionAlteration::NeedMoreRevisions,
            None => RevisionAlteration::AllOptionsExhausted,
        }
    }

    pub(crate) fn describe(&self) -> String {
        MaterialConfig::Dependency(self.material.clone()).to_string()
    }

    /// Source revisions an upstream instance was built from, following
    /// dependency revisions breadth first. `None` when two paths disagree on
    /// the revision of one material.
    fn scm_revisions_of(
        &self,
        entry: &PipelineTimelineEntry,
        ctx: &ResolutionContext<'_>,
    ) -> Result<Option<ScmRevisionSet>> {
        let mut collected = Vec::new();
        let mut queue: VecDeque<Revision> = VecDeque::new();
        let mut visited: BTreeSet<String> = BTreeSet::new();

        enqueue(entry, ctx, &mut collected, &mut queue, &mut visited);
        while let Some(revision) = queue.pop_front() {
            let upstream: StageIdentifier = revision.revision.parse()?;
            let upstream_entry = ctx
                .sources
                .timeline
                .entry_for(&upstream.pipeline_name, upstream.pipeline_counter)?
                .ok_or_else(|| gantry_core::Error::PipelineInstanceNotFound {
                    pipeline: upstream.pipeline_name.clone(),
                    counter: upstream.pipeline_counter,
                })?;
            enqueue(&upstream_entry, ctx, &mut collected, &mut queue, &mut visited);
        }

        let mut set = ScmRevisionSet::new();
        for material in collected {
            match set.get(&material.fingerprint) {
                Some(existing) if !existing.same_revision_as(&material) => return Ok(None),
                Some(_) => {}
                None => {
                    set.insert(material);
                }
            }
        }
        Ok(Some(set))
    }
}

fn enqueue(
    entry: &PipelineTimelineEntry,
    ctx: &ResolutionContext<'_>,
    collected: &mut Vec<FaninScmMaterial>,
    queue: &mut VecDeque<Revision>,
    visited: &mut BTreeSet<String>,
) {
    for (fingerprint, revision) in entry.effective_revisions() {
        if ctx.is_scm(fingerprint) {
            collected.push(FaninScmMaterial::new(fingerprint.clone(), revision.clone()));
        } else if ctx.is_dependency(fingerprint) && visited.insert(revision.revision.clone()) {
            queue.push_back(revision.clone());
        }
    }
}
