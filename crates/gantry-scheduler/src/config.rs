//! Resolver configuration.

use config::{Config, ConfigError, Environment, File};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `GANTRY_FANIN_MAX_BACK_TRACK_LIMIT=20`.
pub const ENV_PREFIX: &str = "GANTRY_FANIN";

/// Fan-in resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FaninConfig {
    /// Reconcile upstream revisions at all. When off, the caller's revisions
    /// are used as given.
    #[serde(default = "default_resolve_fanin_revisions")]
    pub resolve_fanin_revisions: bool,
    /// Maximum historical instances examined per upstream material.
    #[serde(default = "default_max_back_track_limit")]
    pub max_back_track_limit: usize,
    /// Instances examined per scan step.
    #[serde(default = "default_revision_batch_size")]
    pub revision_batch_size: usize,
}

fn default_resolve_fanin_revisions() -> bool {
    true
}

fn default_max_back_track_limit() -> usize {
    100
}

fn default_revision_batch_size() -> usize {
    5
}

impl Default for FaninConfig {
    fn default() -> Self {
        Self {
            resolve_fanin_revisions: default_resolve_fanin_revisions(),
            max_back_track_limit: default_max_back_track_limit(),
            revision_batch_size: default_revision_batch_size(),
        }
    }
}

impl FaninConfig {
    pub fn with_resolve_fanin_revisions(mut self, enabled: bool) -> Self {
        self.resolve_fanin_revisions = enabled;
        self
    }

    pub fn with_max_back_track_limit(mut self, limit: usize) -> Self {
        self.max_back_track_limit = limit;
        self
    }

    pub fn with_revision_batch_size(mut self, size: usize) -> Self {
        self.revision_batch_size = size;
        self
    }

    /// Load defaults, then an optional file (YAML, TOML or JSON by
    /// extension), then `GANTRY_FANIN_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config: Self = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_back_track_limit == 0 {
            return Err(ConfigError::Message(
                "max_back_track_limit must be greater than zero".to_string(),
            ));
        }
        if self.revision_batch_size == 0 {
            return Err(ConfigError::Message(
                "revision_batch_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
