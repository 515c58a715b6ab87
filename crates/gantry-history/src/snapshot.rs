//! Serializable history snapshots.
//!
//! A snapshot is an ordered list of events replayed against an empty store:
//!
//! ```yaml
//! events:
//!   - checkin:
//!       material: { type: scm, kind: git, url: https://example.com/app.git }
//!       revisions: [g1, g2]
//!   - run:
//!       pipeline: build
//!       revisions: [g1]
//!   - run:
//!       pipeline: build
//!       revisions: [g2]
//!       result: failed
//! ```

use crate::error::{HistoryError, Result};
use crate::store::{MemoryHistory, StageResult};
use gantry_core::ids::StageIdentifier;
use gantry_core::material::MaterialConfig;
use gantry_core::pipeline::PipelineConfigs;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HistorySnapshot {
    #[serde(default)]
    pub events: Vec<HistoryEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HistoryEvent {
    /// New revisions of a material, oldest first.
    Checkin {
        material: MaterialConfig,
        revisions: Vec<String>,
    },
    /// A run of a configured pipeline, one revision per material.
    Run {
        pipeline: String,
        revisions: Vec<String>,
        #[serde(default)]
        result: StageResult,
    },
    /// Drop the recorded dependency modification of a passed stage.
    DropStageModifications { stage: String },
}

impl HistorySnapshot {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| HistoryError::Parse(e.to_string()))
    }

    /// Load from a YAML or JSON file, chosen by extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| HistoryError::Parse(e.to_string()))
            }
            _ => Self::from_yaml_str(&content),
        }
    }
}

impl MemoryHistory {
    /// Replay a snapshot. Runs refer to pipelines by name in `configs`.
    pub fn from_snapshot(snapshot: &HistorySnapshot, configs: &PipelineConfigs) -> Result<Self> {
        let mut history = MemoryHistory::new();
        for event in &snapshot.events {
            match event {
                HistoryEvent::Checkin {
                    material,
                    revisions,
                } => {
                    for revision in revisions {
                        history.checkin(material, revision);
                    }
                }
                HistoryEvent::Run {
                    pipeline,
                    revisions,
                    result,
                } => {
                    let config = configs
                        .pipeline(pipeline)
                        .ok_or_else(|| HistoryError::UnknownPipeline(pipeline.clone()))?;
                    let revisions: Vec<&str> = revisions.iter().map(String::as_str).collect();
                    history.record_run(config, &revisions, *result)?;
                }
                HistoryEvent::DropStageModifications { stage } => {
                    let identifier: StageIdentifier = stage
                        .parse()
                        .map_err(|_| HistoryError::InvalidStageLocator(stage.clone()))?;
                    history.remove_stage_modifications(&identifier);
                }
            }
        }
        info!(events = snapshot.events.len(), "Loaded history snapshot");
        Ok(history)
    }
}
