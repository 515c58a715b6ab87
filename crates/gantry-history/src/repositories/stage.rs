//! In-memory implementation of StageLookup.

use crate::store::{MemoryHistory, StageResult};
use gantry_core::Result;
use gantry_core::ids::{PipelineInstanceId, StageIdentifier};
use gantry_core::ports::StageLookup;

impl StageLookup for MemoryHistory {
    fn latest_passed_stage_identifier(
        &self,
        instance: PipelineInstanceId,
        stage_name: &str,
    ) -> Result<Option<StageIdentifier>> {
        Ok(self.run_by_id(instance).and_then(|run| {
            run.stages
                .iter()
                .filter(|stage| {
                    stage.identifier.stage_name == stage_name && stage.result == StageResult::Passed
                })
                .map(|stage| stage.identifier.clone())
                .max_by_key(|identifier| identifier.stage_counter)
        }))
    }
}
