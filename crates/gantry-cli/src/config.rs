//! CLI configuration management.

use gantry_scheduler::FaninConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct CliConfig {
    /// Output format.
    #[serde(default)]
    pub output_format: OutputFormat,
    /// Resolver settings file, layered under the overrides below.
    #[serde(default)]
    pub fanin_config: Option<PathBuf>,
    #[serde(default)]
    pub max_back_track_limit: Option<usize>,
    #[serde(default)]
    pub revision_batch_size: Option<usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Yaml,
}

impl CliConfig {
    /// Load configuration from file.
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let path = Self::config_path()?;
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Ok(serde_yaml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
        let dirs = directories::ProjectDirs::from("dev", "gantry", "gantry-cli")
            .ok_or("Could not determine config directory")?;
        Ok(dirs.config_dir().join("config.yaml"))
    }

    /// Set a configuration value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let parse_limit = |value: &str| {
            value
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| format!("Invalid value for {}: {}", key, value))
        };
        match key {
            "output_format" => {
                self.output_format = match value {
                    "table" => OutputFormat::Table,
                    "json" => OutputFormat::Json,
                    "yaml" => OutputFormat::Yaml,
                    _ => return Err(format!("Invalid output format: {}", value)),
                };
            }
            "fanin_config" => self.fanin_config = Some(PathBuf::from(value)),
            "max_back_track_limit" => self.max_back_track_limit = Some(parse_limit(value)?),
            "revision_batch_size" => self.revision_batch_size = Some(parse_limit(value)?),
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }

    /// Resolver settings: the settings file and environment first, then this
    /// configuration's overrides, then the command line's.
    pub fn fanin(
        &self,
        max_back_track_limit: Option<usize>,
        revision_batch_size: Option<usize>,
    ) -> Result<FaninConfig, Box<dyn std::error::Error>> {
        let mut fanin = FaninConfig::load(self.fanin_config.as_deref())?;
        if let Some(limit) = max_back_track_limit.or(self.max_back_track_limit) {
            fanin = fanin.with_max_back_track_limit(limit);
        }
        if let Some(size) = revision_batch_size.or(self.revision_batch_size) {
            fanin = fanin.with_revision_batch_size(size);
        }
        fanin.validate()?;
        Ok(fanin)
    }
}
