//! Pipeline configuration types.
//!
//! These types represent the user-authored pipeline configuration: which
//! pipelines exist, the materials each one consumes, and its stages.

use crate::material::{DependencyMaterialConfig, Fingerprint, MaterialConfig, ScmMaterialConfig};
use crate::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StageConfig {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl StageConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            display_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub materials: Vec<MaterialConfig>,
    pub stages: Vec<StageConfig>,
}

impl PipelineConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            materials: vec![],
            stages: vec![],
        }
    }

    pub fn with_material(mut self, material: impl Into<MaterialConfig>) -> Self {
        self.materials.push(material.into());
        self
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stages.push(StageConfig::new(stage));
        self
    }

    pub fn first_stage(&self) -> Option<&StageConfig> {
        self.stages.first()
    }

    pub fn stage(&self, name: &str) -> Option<&StageConfig> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn dependency_materials(&self) -> impl Iterator<Item = &DependencyMaterialConfig> {
        self.materials.iter().filter_map(MaterialConfig::as_dependency)
    }

    /// Dependency material pointing at this pipeline's first stage.
    pub fn as_dependency_on_first_stage(&self) -> Result<DependencyMaterialConfig> {
        let stage = self.first_stage().ok_or_else(|| {
            Error::InvalidPipeline(format!("pipeline '{}' has no stages", self.name))
        })?;
        Ok(DependencyMaterialConfig::new(&self.name, &stage.name))
    }
}

/// Every pipeline known to the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineConfigs {
    pub pipelines: Vec<PipelineConfig>,
}

impl PipelineConfigs {
    pub fn new(pipelines: Vec<PipelineConfig>) -> Self {
        Self { pipelines }
    }

    /// Load from a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Load from a YAML or JSON file, chosen by extension.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            _ => Self::from_yaml_str(&content),
        }
    }

    pub fn pipeline(&self, name: &str) -> Option<&PipelineConfig> {
        self.pipelines.iter().find(|p| p.name == name)
    }

    pub fn pipeline_mut(&mut self, name: &str) -> Option<&mut PipelineConfig> {
        self.pipelines.iter_mut().find(|p| p.name == name)
    }

    /// Add a pipeline, replacing any existing one with the same name.
    pub fn upsert(&mut self, pipeline: PipelineConfig) {
        match self.pipeline_mut(&pipeline.name) {
            Some(existing) => *existing = pipeline,
            None => self.pipelines.push(pipeline),
        }
    }

    /// All SCM materials used anywhere in the configuration, by fingerprint.
    pub fn scm_materials(&self) -> BTreeMap<Fingerprint, ScmMaterialConfig> {
        self.pipelines
            .iter()
            .flat_map(|p| p.materials.iter())
            .filter_map(MaterialConfig::as_scm)
            .map(|scm| (scm.fingerprint(), scm.clone()))
            .collect()
    }

    /// All dependency materials used anywhere in the configuration, by fingerprint.
    pub fn dependency_materials(&self) -> BTreeMap<Fingerprint, DependencyMaterialConfig> {
        self.pipelines
            .iter()
            .flat_map(|p| p.dependency_materials())
            .map(|dep| (dep.fingerprint(), dep.clone()))
            .collect()
    }
}
