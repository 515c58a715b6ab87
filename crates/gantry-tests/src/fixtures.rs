//! Test fixtures for building pipeline graphs and their history.

use anyhow::{Context, anyhow};
use gantry_core::ids::StageIdentifier;
use gantry_core::material::{DependencyMaterialConfig, MaterialConfig, ScmKind, ScmMaterialConfig};
use gantry_core::pipeline::{PipelineConfig, PipelineConfigs, StageConfig};
use gantry_core::ports::ModificationLookup;
use gantry_core::revision::{MaterialRevision, MaterialRevisions};
use gantry_history::MemoryHistory;
use gantry_scheduler::{FaninConfig, FaninError, FanInGraph, ResolutionSources};
use tracing::debug;

/// Stage name used when a pipeline is saved without explicit stages.
pub const STAGE: &str = "s";

pub fn git(url: &str) -> MaterialConfig {
    ScmMaterialConfig::git(url).into()
}

pub fn hg(url: &str) -> MaterialConfig {
    ScmMaterialConfig::new(ScmKind::Hg, url).into()
}

pub fn svn(url: &str) -> MaterialConfig {
    ScmMaterialConfig::new(ScmKind::Svn, url).into()
}

pub fn package(url: &str) -> MaterialConfig {
    ScmMaterialConfig::new(ScmKind::Package, url).into()
}

pub fn plugin(url: &str) -> MaterialConfig {
    ScmMaterialConfig::new(ScmKind::Plugin, url).into()
}

/// An SCM material checked out into a folder.
pub fn in_folder(material: MaterialConfig, folder: &str) -> MaterialConfig {
    match material {
        MaterialConfig::Scm(scm) => scm.with_folder(folder).into(),
        other => other,
    }
}

/// Dependency on the first stage of `pipeline`.
pub fn dep(pipeline: &PipelineConfig) -> MaterialConfig {
    let stage = pipeline.first_stage().map_or(STAGE, |stage| stage.name.as_str());
    DependencyMaterialConfig::new(&pipeline.name, stage).into()
}

/// Named dependency on the first stage of `pipeline`.
pub fn named_dep(pipeline: &PipelineConfig, name: &str) -> MaterialConfig {
    match dep(pipeline) {
        MaterialConfig::Dependency(dependency) => dependency.with_name(name).into(),
        other => other,
    }
}

pub fn dep_on(pipeline: &str, stage: &str) -> MaterialConfig {
    DependencyMaterialConfig::new(pipeline, stage).into()
}

/// Latest revision of every material, in order.
pub fn latest_revisions(revisions: &MaterialRevisions) -> Vec<String> {
    revisions
        .iter()
        .map(|revision| {
            revision
                .latest_modification()
                .map(|modification| modification.revision.clone())
                .unwrap_or_default()
        })
        .collect()
}

/// Pipeline configuration and history, kept side by side.
#[derive(Debug, Default)]
pub struct ScheduleFixture {
    pub configs: PipelineConfigs,
    pub history: MemoryHistory,
}

impl ScheduleFixture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a single stage pipeline.
    pub fn save_config_with(
        &mut self,
        name: &str,
        materials: impl IntoIterator<Item = MaterialConfig>,
    ) -> PipelineConfig {
        self.save_config_with_stages(name, &[STAGE], materials)
    }

    pub fn save_config_with_stages(
        &mut self,
        name: &str,
        stages: &[&str],
        materials: impl IntoIterator<Item = MaterialConfig>,
    ) -> PipelineConfig {
        let mut pipeline = PipelineConfig::new(name);
        pipeline.materials = materials.into_iter().collect();
        pipeline.stages = stages.iter().copied().map(StageConfig::new).collect();
        self.configs.upsert(pipeline.clone());
        pipeline
    }

    pub fn add_material_to_pipeline(
        &mut self,
        name: &str,
        material: MaterialConfig,
    ) -> anyhow::Result<PipelineConfig> {
        self.edit_pipeline(name, |pipeline| pipeline.materials.push(material))
    }

    pub fn change_stage_name(
        &mut self,
        name: &str,
        from: &str,
        to: &str,
    ) -> anyhow::Result<PipelineConfig> {
        self.edit_pipeline(name, |pipeline| {
            for stage in pipeline.stages.iter_mut().filter(|stage| stage.name == from) {
                stage.name = to.to_string();
            }
        })
    }

    fn edit_pipeline(
        &mut self,
        name: &str,
        edit: impl FnOnce(&mut PipelineConfig),
    ) -> anyhow::Result<PipelineConfig> {
        let pipeline = self
            .configs
            .pipeline_mut(name)
            .ok_or_else(|| anyhow!("pipeline '{}' is not configured", name))?;
        edit(pipeline);
        Ok(pipeline.clone())
    }

    pub fn checkin_in_order(&mut self, material: &MaterialConfig, revisions: &[&str]) {
        self.history.checkin_in_order(material, revisions);
    }

    /// Run `pipeline` to success and return the locator of its first stage.
    pub fn run_and_pass(
        &mut self,
        pipeline: &PipelineConfig,
        revisions: &[&str],
    ) -> anyhow::Result<String> {
        let run = self
            .history
            .run_and_pass(pipeline, revisions)
            .with_context(|| format!("running {} with {:?}", pipeline.name, revisions))?;
        Ok(run.locator())
    }

    /// Run `pipeline` and fail its first stage.
    pub fn run_and_fail(
        &mut self,
        pipeline: &PipelineConfig,
        revisions: &[&str],
    ) -> anyhow::Result<String> {
        let run = self
            .history
            .run_and_fail(pipeline, revisions)
            .with_context(|| format!("running {} with {:?}", pipeline.name, revisions))?;
        Ok(run.locator())
    }

    /// Forget the recorded modification of a passed stage.
    pub fn drop_stage_modifications(&mut self, locator: &str) -> anyhow::Result<()> {
        let stage: StageIdentifier = locator.parse()?;
        self.history.remove_stage_modifications(&stage);
        Ok(())
    }

    /// A material at one recorded revision. Dependency revisions are stage
    /// locators.
    pub fn mr(&self, material: &MaterialConfig, revision: &str) -> anyhow::Result<MaterialRevision> {
        let modification = match material {
            MaterialConfig::Scm(_) => self.history.modification_by_revision(material, revision).cloned(),
            MaterialConfig::Dependency(_) => {
                let stage: StageIdentifier = revision.parse()?;
                self.history.modifications_for(&stage)?.into_iter().next()
            }
        };
        let modification =
            modification.ok_or_else(|| anyhow!("no modification of {} at {}", material, revision))?;
        Ok(MaterialRevision::new(material.clone(), vec![modification]))
    }

    pub fn mrs(&self, revisions: &[(&MaterialConfig, &str)]) -> anyhow::Result<MaterialRevisions> {
        revisions
            .iter()
            .map(|(material, revision)| self.mr(material, revision))
            .collect()
    }

    pub fn resolve(
        &self,
        pipeline: &str,
        given: &MaterialRevisions,
    ) -> Result<MaterialRevisions, FaninError> {
        self.resolve_with(pipeline, given, &FaninConfig::default())
    }

    pub fn resolve_with(
        &self,
        pipeline: &str,
        given: &MaterialRevisions,
        config: &FaninConfig,
    ) -> Result<MaterialRevisions, FaninError> {
        debug!(pipeline, given = given.len(), "Resolving scenario");
        let graph = FanInGraph::build(&self.configs, pipeline)?;
        graph.compute_revisions(given, ResolutionSources::from_store(&self.history), config)
    }

    pub fn report(&self, pipeline: &str) -> Result<Option<MaterialRevisions>, FaninError> {
        let graph = FanInGraph::build(&self.configs, pipeline)?;
        graph.compute_revisions_for_reporting(
            ResolutionSources::from_store(&self.history),
            &FaninConfig::default(),
        )
    }
}
