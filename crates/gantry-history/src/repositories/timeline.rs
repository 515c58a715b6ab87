//! In-memory implementation of PipelineTimeline.

use crate::store::{MemoryHistory, PipelineRun};
use gantry_core::Result;
use gantry_core::ports::PipelineTimeline;
use gantry_core::timeline::PipelineTimelineEntry;

impl PipelineTimeline for MemoryHistory {
    fn instance_count(&self, pipeline: &str) -> Result<usize> {
        Ok(self.runs(pipeline).len())
    }

    fn instance_for(&self, pipeline: &str, index: usize) -> Result<Option<PipelineTimelineEntry>> {
        Ok(self.runs(pipeline).get(index).map(PipelineRun::to_timeline_entry))
    }

    fn entry_for(&self, pipeline: &str, counter: u32) -> Result<Option<PipelineTimelineEntry>> {
        Ok(self.run(pipeline, counter).map(PipelineRun::to_timeline_entry))
    }
}
