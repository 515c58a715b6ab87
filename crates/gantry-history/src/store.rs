//! In-memory history of check-ins and pipeline runs.

use crate::error::{HistoryError, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use gantry_core::ids::{ModificationId, PipelineInstanceId, StageIdentifier};
use gantry_core::material::{DependencyMaterialConfig, Fingerprint, MaterialConfig};
use gantry_core::pipeline::PipelineConfig;
use gantry_core::revision::{MaterialRevision, MaterialRevisions, Modification};
use gantry_core::timeline::PipelineTimelineEntry;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// 2024-01-01T00:00:00Z
const DEFAULT_START: i64 = 1_704_067_200;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StageResult {
    #[default]
    Passed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRun {
    pub identifier: StageIdentifier,
    pub result: StageResult,
}

/// One recorded instance of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineRun {
    pub id: PipelineInstanceId,
    pub pipeline_name: String,
    pub counter: u32,
    /// The build cause: one modification per configured material.
    pub revisions: Vec<(MaterialConfig, Modification)>,
    pub stages: Vec<StageRun>,
}

impl PipelineRun {
    /// Locator of the first stage, the revision downstream pipelines see.
    pub fn locator(&self) -> String {
        self.stages
            .first()
            .map(|stage| stage.identifier.stage_locator())
            .unwrap_or_default()
    }

    pub fn stage(&self, name: &str) -> Option<&StageRun> {
        self.stages.iter().find(|stage| stage.identifier.stage_name == name)
    }

    pub fn stage_locator(&self, name: &str) -> Option<String> {
        self.stage(name).map(|stage| stage.identifier.stage_locator())
    }

    pub fn passed(&self) -> bool {
        self.stages.iter().all(|stage| stage.result == StageResult::Passed)
    }

    pub fn build_cause(&self) -> MaterialRevisions {
        self.revisions
            .iter()
            .map(|(material, modification)| {
                MaterialRevision::new(material.clone(), vec![modification.clone()])
            })
            .collect()
    }

    pub fn to_timeline_entry(&self) -> PipelineTimelineEntry {
        self.revisions.iter().fold(
            PipelineTimelineEntry::new(&self.pipeline_name, self.id, self.counter),
            |entry, (material, modification)| {
                entry.with_revision(material.fingerprint(), modification.to_revision())
            },
        )
    }
}

/// History held in memory.
///
/// Every recorded modification gets a fresh id and a timestamp one minute
/// after the previous one, so recording order is chronological order.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    clock: DateTime<Utc>,
    next_modification_id: u64,
    next_instance_id: u64,
    /// Modifications per material, oldest first. Passed stages are recorded
    /// here as modifications of the matching dependency material.
    pub(crate) modifications: BTreeMap<Fingerprint, Vec<Modification>>,
    /// Dependency modifications by stage locator.
    pub(crate) stage_modifications: BTreeMap<String, Vec<Modification>>,
    /// Runs per pipeline in counter order.
    pub(crate) runs: BTreeMap<String, Vec<PipelineRun>>,
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHistory {
    pub fn new() -> Self {
        let start = Utc.timestamp_opt(DEFAULT_START, 0).single().unwrap_or_default();
        Self::starting_at(start)
    }

    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            clock: start,
            next_modification_id: 1,
            next_instance_id: 1,
            modifications: BTreeMap::new(),
            stage_modifications: BTreeMap::new(),
            runs: BTreeMap::new(),
        }
    }

    fn new_modification(&mut self, revision: impl Into<String>) -> Modification {
        self.clock += Duration::minutes(1);
        let id = ModificationId::new(self.next_modification_id);
        self.next_modification_id += 1;
        Modification::new(id, revision, self.clock)
    }

    /// Record a new revision of a material.
    pub fn checkin(&mut self, material: &MaterialConfig, revision: &str) -> Modification {
        let modification = self.new_modification(revision);
        self.modifications
            .entry(material.fingerprint())
            .or_default()
            .push(modification.clone());
        modification
    }

    pub fn checkin_in_order(&mut self, material: &MaterialConfig, revisions: &[&str]) -> Vec<Modification> {
        revisions.iter().map(|revision| self.checkin(material, revision)).collect()
    }

    pub fn modification_by_revision(&self, material: &MaterialConfig, revision: &str) -> Option<&Modification> {
        self.modifications
            .get(&material.fingerprint())
            .and_then(|mods| mods.iter().find(|m| m.revision == revision))
    }

    /// Record a run of `pipeline` built from one revision per material, in
    /// the order the pipeline declares its materials. SCM revisions must have
    /// been checked in and dependency revisions are stage locators of passed
    /// upstream stages.
    ///
    /// A passed run passes every stage. A failed run fails its first stage.
    pub fn record_run(
        &mut self,
        pipeline: &PipelineConfig,
        revisions: &[&str],
        result: StageResult,
    ) -> Result<PipelineRun> {
        if pipeline.stages.is_empty() {
            return Err(HistoryError::NoStages(pipeline.name.clone()));
        }
        if revisions.len() != pipeline.materials.len() {
            return Err(HistoryError::RevisionCountMismatch {
                pipeline: pipeline.name.clone(),
                expected: pipeline.materials.len(),
                actual: revisions.len(),
            });
        }

        let build_cause = pipeline
            .materials
            .iter()
            .zip(revisions)
            .map(|(material, revision)| {
                self.modification_by_revision(material, revision)
                    .cloned()
                    .map(|modification| (material.clone(), modification))
                    .ok_or_else(|| HistoryError::UnknownRevision {
                        material: material.to_string(),
                        revision: revision.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let counter = self.runs.get(&pipeline.name).map_or(0, Vec::len) as u32 + 1;
        let id = PipelineInstanceId::new(self.next_instance_id);
        self.next_instance_id += 1;

        let stages = match result {
            StageResult::Passed => pipeline
                .stages
                .iter()
                .map(|stage| {
                    let identifier = StageIdentifier::new(&pipeline.name, counter, &stage.name, 1);
                    self.record_passed_stage(&identifier);
                    StageRun {
                        identifier,
                        result: StageResult::Passed,
                    }
                })
                .collect(),
            StageResult::Failed => pipeline
                .first_stage()
                .map(|stage| StageRun {
                    identifier: StageIdentifier::new(&pipeline.name, counter, &stage.name, 1),
                    result: StageResult::Failed,
                })
                .into_iter()
                .collect(),
        };

        let run = PipelineRun {
            id,
            pipeline_name: pipeline.name.clone(),
            counter,
            revisions: build_cause,
            stages,
        };
        debug!(
            pipeline = %run.pipeline_name,
            counter,
            passed = run.passed(),
            "Recorded pipeline run"
        );
        self.runs.entry(pipeline.name.clone()).or_default().push(run.clone());
        Ok(run)
    }

    pub fn run_and_pass(&mut self, pipeline: &PipelineConfig, revisions: &[&str]) -> Result<PipelineRun> {
        self.record_run(pipeline, revisions, StageResult::Passed)
    }

    pub fn run_and_fail(&mut self, pipeline: &PipelineConfig, revisions: &[&str]) -> Result<PipelineRun> {
        self.record_run(pipeline, revisions, StageResult::Failed)
    }

    fn record_passed_stage(&mut self, stage: &StageIdentifier) {
        let material = DependencyMaterialConfig::new(&stage.pipeline_name, &stage.stage_name);
        let mut modification = self.new_modification(stage.stage_locator());
        modification.pipeline_label = Some(stage.pipeline_counter.to_string());
        self.modifications
            .entry(material.fingerprint())
            .or_default()
            .push(modification.clone());
        self.stage_modifications
            .insert(stage.stage_locator(), vec![modification]);
    }

    /// Forget the dependency modification of a passed stage, as when history
    /// was only partially persisted.
    pub fn remove_stage_modifications(&mut self, stage: &StageIdentifier) -> Vec<Modification> {
        let locator = stage.stage_locator();
        let material = DependencyMaterialConfig::new(&stage.pipeline_name, &stage.stage_name);
        if let Some(mods) = self.modifications.get_mut(&material.fingerprint()) {
            mods.retain(|m| m.revision != locator);
        }
        self.stage_modifications.remove(&locator).unwrap_or_default()
    }

    pub fn runs(&self, pipeline: &str) -> &[PipelineRun] {
        self.runs.get(pipeline).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn run(&self, pipeline: &str, counter: u32) -> Option<&PipelineRun> {
        self.runs(pipeline).iter().find(|run| run.counter == counter)
    }

    pub(crate) fn run_by_id(&self, id: PipelineInstanceId) -> Option<&PipelineRun> {
        self.runs.values().flatten().find(|run| run.id == id)
    }
}
