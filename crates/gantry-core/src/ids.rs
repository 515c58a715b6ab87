//! Strongly-typed identifiers for domain entities.

use crate::Error;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $prefix:expr) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub fn new(value: u64) -> Self {
                Self(value)
            }

            pub fn value(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", $prefix, self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                let raw = s.strip_prefix(concat!($prefix, "_")).unwrap_or(s);
                Ok(Self(raw.parse()?))
            }
        }
    };
}

define_id!(PipelineInstanceId, "pin");
define_id!(ModificationId, "mod");

/// Identifies one run of one stage of one pipeline instance.
///
/// The textual form, `pipeline/counter/stage/stage_counter`, is the stage
/// locator. It doubles as the revision string of a dependency material.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct StageIdentifier {
    pub pipeline_name: String,
    pub pipeline_counter: u32,
    pub stage_name: String,
    pub stage_counter: u32,
}

impl StageIdentifier {
    pub fn new(
        pipeline_name: impl Into<String>,
        pipeline_counter: u32,
        stage_name: impl Into<String>,
        stage_counter: u32,
    ) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            pipeline_counter,
            stage_name: stage_name.into(),
            stage_counter,
        }
    }

    pub fn stage_locator(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for StageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.pipeline_name, self.pipeline_counter, self.stage_name, self.stage_counter
        )
    }
}

impl std::str::FromStr for StageIdentifier {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || Error::InvalidStageLocator(s.to_string());
        let parts: Vec<&str> = s.split('/').collect();
        let [pipeline, counter, stage, stage_counter] = parts.as_slice() else {
            return Err(invalid());
        };
        if pipeline.is_empty() || stage.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            pipeline_name: pipeline.to_string(),
            pipeline_counter: counter.parse().map_err(|_| invalid())?,
            stage_name: stage.to_string(),
            stage_counter: stage_counter.parse().map_err(|_| invalid())?,
        })
    }
}
