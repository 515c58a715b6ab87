//! Dependency graph between configured pipelines.

use gantry_core::pipeline::{PipelineConfig, PipelineConfigs};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DagError {
    #[error("Cycle detected in pipeline dependencies at '{0}'")]
    CycleDetected(String),
    #[error("Pipeline '{pipeline}' depends on unknown pipeline '{upstream}'")]
    UnknownPipeline { pipeline: String, upstream: String },
    #[error("Pipeline '{pipeline}' depends on unknown stage '{upstream}/{stage}'")]
    UnknownStage {
        pipeline: String,
        upstream: String,
        stage: String,
    },
    #[error("Pipeline '{0}' has no stages")]
    EmptyPipeline(String),
    #[error("Pipeline '{0}' is defined more than once")]
    DuplicatePipeline(String),
}

/// A pipeline in the dependency graph.
#[derive(Debug, Clone)]
pub struct DagNode {
    pub name: String,
    pub definition: PipelineConfig,
}

/// Pipelines as nodes, with an edge from each upstream pipeline to every
/// pipeline that depends on one of its stages. Edges carry the stage name.
#[derive(Debug)]
pub struct PipelineDependencyGraph {
    graph: DiGraph<DagNode, String>,
    name_to_index: HashMap<String, NodeIndex>,
}

impl PipelineDependencyGraph {
    /// Pipelines without upstream dependencies.
    pub fn roots(&self) -> Vec<&DagNode> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .neighbors_directed(idx, petgraph::Direction::Incoming)
                    .count()
                    == 0
            })
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect()
    }

    /// Pipelines that depend directly on a pipeline.
    pub fn downstream(&self, pipeline: &str) -> Vec<&DagNode> {
        self.neighbors(pipeline, petgraph::Direction::Outgoing)
    }

    /// Pipelines a pipeline depends on directly.
    pub fn upstream(&self, pipeline: &str) -> Vec<&DagNode> {
        self.neighbors(pipeline, petgraph::Direction::Incoming)
    }

    fn neighbors(&self, pipeline: &str, direction: petgraph::Direction) -> Vec<&DagNode> {
        let mut nodes: Vec<&DagNode> = self
            .name_to_index
            .get(pipeline)
            .map(|&idx| {
                self.graph
                    .neighbors_directed(idx, direction)
                    .filter_map(|n| self.graph.node_weight(n))
                    .collect()
            })
            .unwrap_or_default();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        nodes.dedup_by(|a, b| a.name == b.name);
        nodes
    }

    /// Pipelines ordered so that every pipeline follows its upstreams.
    pub fn topological_order(&self) -> Result<Vec<&DagNode>, DagError> {
        toposort(&self.graph, None)
            .map(|indices| {
                indices
                    .iter()
                    .filter_map(|&idx| self.graph.node_weight(idx))
                    .collect()
            })
            .map_err(|cycle| {
                let name = self
                    .graph
                    .node_weight(cycle.node_id())
                    .map(|node| node.name.clone())
                    .unwrap_or_default();
                DagError::CycleDetected(name)
            })
    }

    pub fn pipelines(&self) -> Vec<&DagNode> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect()
    }

    /// Whether the pipeline reaches the same pipeline through two or more
    /// distinct upstream paths.
    pub fn has_fan_in(&self, pipeline: &str) -> bool {
        let Some(&start) = self.name_to_index.get(pipeline) else {
            return false;
        };
        let mut counts: HashMap<NodeIndex, usize> = HashMap::new();
        let mut stack = vec![start];
        while let Some(idx) = stack.pop() {
            for upstream in self.graph.neighbors_directed(idx, petgraph::Direction::Incoming) {
                let count = counts.entry(upstream).or_default();
                *count += 1;
                if *count > 1 {
                    return true;
                }
                stack.push(upstream);
            }
        }
        false
    }
}

/// Builder for pipeline dependency graphs.
pub struct DagBuilder;

impl DagBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build and validate the dependency graph of a configuration.
    pub fn build(&self, configs: &PipelineConfigs) -> Result<PipelineDependencyGraph, DagError> {
        let mut graph = DiGraph::new();
        let mut name_to_index = HashMap::new();

        for pipeline in &configs.pipelines {
            if pipeline.stages.is_empty() {
                return Err(DagError::EmptyPipeline(pipeline.name.clone()));
            }
            let node = DagNode {
                name: pipeline.name.clone(),
                definition: pipeline.clone(),
            };
            let idx = graph.add_node(node);
            if name_to_index.insert(pipeline.name.clone(), idx).is_some() {
                return Err(DagError::DuplicatePipeline(pipeline.name.clone()));
            }
        }

        for pipeline in &configs.pipelines {
            let pipeline_idx = name_to_index[&pipeline.name];
            for dependency in pipeline.dependency_materials() {
                let upstream_idx = name_to_index.get(&dependency.pipeline).ok_or_else(|| {
                    DagError::UnknownPipeline {
                        pipeline: pipeline.name.clone(),
                        upstream: dependency.pipeline.clone(),
                    }
                })?;
                let upstream = &graph[*upstream_idx];
                if upstream.definition.stage(&dependency.stage).is_none() {
                    return Err(DagError::UnknownStage {
                        pipeline: pipeline.name.clone(),
                        upstream: dependency.pipeline.clone(),
                        stage: dependency.stage.clone(),
                    });
                }
                graph.add_edge(*upstream_idx, pipeline_idx, dependency.stage.clone());
            }
        }

        let dag = PipelineDependencyGraph {
            graph,
            name_to_index,
        };

        // Verify no cycles
        dag.topological_order()?;

        Ok(dag)
    }
}

impl Default for DagBuilder {
    fn default() -> Self {
        Self::new()
    }
}
