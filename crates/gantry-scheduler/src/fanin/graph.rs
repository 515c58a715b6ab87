//! The fan-in graph of one pipeline and revision reconciliation over it.

use super::context::{ResolutionContext, ResolutionSources};
use super::error::{FaninError, Result};
use super::node::{DependencyNode, FanInNode, ScmNode};
use super::resolver::{NodeResolver, RevisionAlteration};
use super::revision::StageScmRevision;
use crate::config::FaninConfig;
use gantry_core::ids::StageIdentifier;
use gantry_core::material::{DependencyMaterialConfig, Fingerprint, MaterialConfig, ScmMaterialConfig};
use gantry_core::pipeline::{PipelineConfig, PipelineConfigs};
use gantry_core::revision::{MaterialRevision, MaterialRevisions, Modification, Revision};
use gantry_core::timeline::PipelineTimelineEntry;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, debug_span, info};

/// Materials of a pipeline and, transitively, of everything upstream of it.
///
/// The graph only depends on configuration. Build it once per resolution;
/// all resolution state lives in the call to [`FanInGraph::compute_revisions`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FanInGraph {
    pipeline: PipelineConfig,
    root: Fingerprint,
    nodes: BTreeMap<Fingerprint, FanInNode>,
    scm_materials: BTreeMap<Fingerprint, ScmMaterialConfig>,
    dependency_materials: BTreeMap<Fingerprint, DependencyMaterialConfig>,
}

impl FanInGraph {
    /// Expand the configuration of `pipeline` and its upstream pipelines.
    pub fn build(configs: &PipelineConfigs, pipeline: &str) -> Result<Self> {
        let target = configs
            .pipeline(pipeline)
            .ok_or_else(|| FaninError::PipelineNotFound(pipeline.to_string()))?
            .clone();
        let root_material = target.as_dependency_on_first_stage()?;

        let mut graph = Self {
            root: root_material.fingerprint(),
            pipeline: target,
            nodes: BTreeMap::new(),
            scm_materials: configs.scm_materials(),
            dependency_materials: configs.dependency_materials(),
        };
        let mut visited = BTreeSet::new();
        graph.expand(configs, &root_material, &mut visited)?;
        debug!(pipeline, nodes = graph.nodes.len(), "Built fan-in graph");
        Ok(graph)
    }

    fn expand(
        &mut self,
        configs: &PipelineConfigs,
        material: &DependencyMaterialConfig,
        visited: &mut BTreeSet<Fingerprint>,
    ) -> Result<BTreeSet<Fingerprint>> {
        let fingerprint = material.fingerprint();
        if !visited.insert(fingerprint.clone()) {
            // Either expanded already or still on the stack of a cycle.
            return Ok(self.reachable_scm(&fingerprint).cloned().unwrap_or_default());
        }

        let pipeline = configs
            .pipeline(&material.pipeline)
            .ok_or_else(|| FaninError::PipelineNotFound(material.pipeline.clone()))?;

        let mut children = Vec::new();
        let mut reachable = BTreeSet::new();
        for child in &pipeline.materials {
            let child_fingerprint = child.fingerprint();
            match child {
                MaterialConfig::Scm(scm) => {
                    self.nodes
                        .entry(child_fingerprint.clone())
                        .or_insert_with(|| FanInNode::Scm(ScmNode { material: scm.clone() }));
                    reachable.insert(child_fingerprint.clone());
                }
                MaterialConfig::Dependency(dependency) => {
                    reachable.extend(self.expand(configs, dependency, visited)?);
                }
            }
            if !children.contains(&child_fingerprint) {
                children.push(child_fingerprint);
            }
        }

        self.nodes.insert(
            fingerprint,
            FanInNode::Dependency(DependencyNode {
                material: material.clone(),
                children,
                reachable_scm: reachable.clone(),
            }),
        );
        Ok(reachable)
    }

    pub fn pipeline_name(&self) -> &str {
        &self.pipeline.name
    }

    /// Fingerprint of the synthetic node standing for the pipeline itself.
    pub fn root(&self) -> &Fingerprint {
        &self.root
    }

    pub fn node(&self, fingerprint: &Fingerprint) -> Option<&FanInNode> {
        self.nodes.get(fingerprint)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&Fingerprint, &FanInNode)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn reachable_scm(&self, fingerprint: &Fingerprint) -> Option<&BTreeSet<Fingerprint>> {
        self.nodes
            .get(fingerprint)
            .and_then(FanInNode::as_dependency)
            .map(|node| &node.reachable_scm)
    }

    fn root_node(&self) -> Result<&DependencyNode> {
        self.nodes
            .get(&self.root)
            .and_then(FanInNode::as_dependency)
            .ok_or_else(|| {
                gantry_core::Error::Internal(format!(
                    "fan-in graph of '{}' has no root node",
                    self.pipeline.name
                ))
                .into()
            })
    }

    /// Upstream dependencies declared directly by the pipeline.
    pub fn dependency_children(&self) -> Vec<&DependencyNode> {
        self.direct_children()
            .filter_map(FanInNode::as_dependency)
            .collect()
    }

    /// Source repositories declared directly by the pipeline.
    pub fn scm_children(&self) -> Vec<&ScmNode> {
        self.direct_children()
            .filter_map(|node| match node {
                FanInNode::Scm(scm) => Some(scm),
                FanInNode::Dependency(_) => None,
            })
            .collect()
    }

    fn direct_children(&self) -> impl Iterator<Item = &FanInNode> {
        self.root_node()
            .map(|root| root.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|fingerprint| self.nodes.get(fingerprint))
    }

    /// Revisions a new run of the pipeline should be built from.
    ///
    /// `actual` is the build cause the caller already computed. It is returned
    /// unchanged when the pipeline has no upstream dependencies.
    pub fn compute_revisions(
        &self,
        actual: &MaterialRevisions,
        sources: ResolutionSources<'_>,
        config: &FaninConfig,
    ) -> Result<MaterialRevisions> {
        let _span = debug_span!("fanin", pipeline = %self.pipeline.name).entered();
        self.check_direct_dependencies(actual)?;
        match self.resolve(sources, config, Some(actual))? {
            Some(revisions) => Ok(revisions),
            None => Ok(actual.clone()),
        }
    }

    /// Reconciled revisions without a caller supplied build cause, for
    /// display. `None` when the pipeline has no upstream dependencies.
    pub fn compute_revisions_for_reporting(
        &self,
        sources: ResolutionSources<'_>,
        config: &FaninConfig,
    ) -> Result<Option<MaterialRevisions>> {
        let _span = debug_span!("fanin_report", pipeline = %self.pipeline.name).entered();
        self.resolve(sources, config, None)
    }

    fn check_direct_dependencies(&self, actual: &MaterialRevisions) -> Result<()> {
        for dependency in self.pipeline.dependency_materials() {
            if !actual.contains(&dependency.fingerprint()) {
                return Err(FaninError::MissingDirectDependency {
                    pipeline: self.pipeline.name.clone(),
                    material: MaterialConfig::Dependency(dependency.clone()).to_string(),
                });
            }
        }
        Ok(())
    }

    fn resolve(
        &self,
        sources: ResolutionSources<'_>,
        config: &FaninConfig,
        actual: Option<&MaterialRevisions>,
    ) -> Result<Option<MaterialRevisions>> {
        config.validate()?;
        let children = self.dependency_children();
        if children.is_empty() {
            debug!("No upstream dependencies, nothing to reconcile");
            return Ok(None);
        }

        let ctx = ResolutionContext {
            pipeline: &self.pipeline.name,
            sources,
            scm_materials: &self.scm_materials,
            dependency_materials: &self.dependency_materials,
            max_back_track_limit: config.max_back_track_limit,
            batch_size: config.revision_batch_size,
        };

        let mut resolvers: Vec<NodeResolver> = children
            .iter()
            .map(|node| NodeResolver::new(node.material.clone(), node.reachable_scm.clone()))
            .collect();
        for resolver in &mut resolvers {
            resolver.populate_revisions(&ctx)?;
        }

        let iterations = reconcile(&mut resolvers, &ctx)?;
        let revisions = self.assemble(&resolvers, &ctx, actual)?;
        info!(
            iterations,
            materials = revisions.len(),
            "Resolved fan-in revisions"
        );
        Ok(Some(revisions))
    }

    fn assemble(
        &self,
        resolvers: &[NodeResolver],
        ctx: &ResolutionContext<'_>,
        actual: Option<&MaterialRevisions>,
    ) -> Result<MaterialRevisions> {
        let mut agreed: BTreeMap<Fingerprint, Revision> = BTreeMap::new();
        let mut pinned: BTreeMap<Fingerprint, StageIdentifier> = BTreeMap::new();
        for resolver in resolvers {
            if let Some((stage, scm)) = resolver.current_revision() {
                pinned.insert(resolver.fingerprint(), stage.clone());
                for material in scm {
                    agreed
                        .entry(material.fingerprint.clone())
                        .or_insert_with(|| material.revision.clone());
                }
            }
        }

        let previous = self.previous_run(ctx)?;
        let mut revisions = MaterialRevisions::new();
        let mut seen = BTreeSet::new();
        for material in &self.pipeline.materials {
            let fingerprint = material.fingerprint();
            if !seen.insert(fingerprint.clone()) {
                continue;
            }
            match material {
                MaterialConfig::Scm(_) => {
                    let given = actual.and_then(|actual| actual.find(&fingerprint));
                    let mut modifications = scm_modifications(
                        material,
                        agreed.get(&fingerprint),
                        previous.as_ref(),
                        ctx,
                    )?;
                    if modifications.is_empty() {
                        if let Some(given) = given {
                            modifications = given.modifications.clone();
                        }
                    }
                    let material = given.map_or_else(|| material.clone(), |g| g.material.clone());
                    revisions.push(MaterialRevision::new(material, modifications));
                }
                MaterialConfig::Dependency(_) => {
                    let stage = pinned.get(&fingerprint).ok_or_else(|| {
                        gantry_core::Error::Internal(format!(
                            "no pinned instance for dependency '{material}'"
                        ))
                    })?;
                    let modifications = ctx.sources.modifications.modifications_for(stage)?;
                    if modifications.is_empty() {
                        return Err(FaninError::NoModificationsPresentForDependentMaterial {
                            pipeline: self.pipeline.name.clone(),
                            material: material.to_string(),
                            stage_locator: stage.stage_locator(),
                        });
                    }
                    revisions.push(MaterialRevision::new(material.clone(), modifications));
                }
            }
        }
        Ok(revisions)
    }

    /// Most recent run of the pipeline itself, passed or failed.
    fn previous_run(&self, ctx: &ResolutionContext<'_>) -> Result<Option<PipelineTimelineEntry>> {
        let count = ctx.sources.timeline.instance_count(&self.pipeline.name)?;
        if count == 0 {
            return Ok(None);
        }
        Ok(ctx.sources.timeline.instance_for(&self.pipeline.name, count - 1)?)
    }
}

/// Move pinned instances back until every upstream agrees on each shared
/// source material. Returns the number of rounds taken.
fn reconcile(resolvers: &mut [NodeResolver], ctx: &ResolutionContext<'_>) -> Result<usize> {
    let mut iterations = 0;
    loop {
        let pairs: Vec<StageScmRevision> = resolvers.iter().flat_map(NodeResolver::current_pairs).collect();
        let Some(target) = smallest_disagreeing(&pairs) else {
            return Ok(iterations);
        };
        iterations += 1;
        debug!(
            iteration = iterations,
            material = %target.fingerprint(),
            revision = %target.revision(),
            stage = %target.stage,
            "Upstream revisions disagree, moving to oldest"
        );

        for resolver in resolvers.iter_mut() {
            loop {
                match resolver.set_revision_to(&target) {
                    RevisionAlteration::NeedMoreRevisions => resolver.fill_next_revisions(ctx)?,
                    RevisionAlteration::AllOptionsExhausted => {
                        return Err(FaninError::FailedToFindCompatibleRevision {
                            pipeline: ctx.pipeline.to_string(),
                            material: resolver.describe(),
                        });
                    }
                    RevisionAlteration::NotApplicable
                    | RevisionAlteration::SameAsCurrentRevision
                    | RevisionAlteration::AlteredToCorrectRevision => break,
                }
            }
        }
    }
}

/// Oldest revision among materials the upstreams disagree on.
fn smallest_disagreeing(pairs: &[StageScmRevision]) -> Option<StageScmRevision> {
    let mut by_material: BTreeMap<&Fingerprint, Vec<&StageScmRevision>> = BTreeMap::new();
    for pair in pairs {
        by_material.entry(pair.fingerprint()).or_default().push(pair);
    }

    by_material
        .into_values()
        .filter(|group| {
            let distinct: BTreeSet<&Revision> = group.iter().map(|pair| pair.revision()).collect();
            distinct.len() > 1
        })
        .flatten()
        .min_by(|a, b| {
            a.revision()
                .cmp(b.revision())
                .then_with(|| a.fingerprint().cmp(b.fingerprint()))
        })
        .cloned()
}

/// Modifications of a direct SCM material. Without a previous run of the
/// pipeline this is the latest modification, which may be newer than the
/// revision the upstream dependencies agreed on.
fn scm_modifications(
    material: &MaterialConfig,
    agreed: Option<&Revision>,
    previous: Option<&PipelineTimelineEntry>,
    ctx: &ResolutionContext<'_>,
) -> Result<Vec<Modification>> {
    let fingerprint = material.fingerprint();
    let lookup = ctx.sources.modifications;

    let Some(last_used) = previous.and_then(|entry| entry.revision_for(&fingerprint)) else {
        let latest = lookup.latest_modifications(std::slice::from_ref(material))?;
        return Ok(latest
            .find(&fingerprint)
            .map(|revision| revision.modifications.clone())
            .unwrap_or_default());
    };

    if let Some(agreed) = agreed.filter(|agreed| *agreed <= last_used) {
        return point_lookup(material, &agreed.revision, ctx);
    }

    let since = lookup.modifications_since(material, last_used, agreed)?;
    if !since.is_empty() {
        return Ok(since);
    }
    point_lookup(material, &last_used.revision, ctx)
}

fn point_lookup(
    material: &MaterialConfig,
    revision: &str,
    ctx: &ResolutionContext<'_>,
) -> Result<Vec<Modification>> {
    let modification = ctx
        .sources
        .modifications
        .modification_at(material, revision)?
        .ok_or_else(|| gantry_core::Error::ModificationNotFound {
            material: material.to_string(),
            revision: revision.to_string(),
        })?;
    Ok(vec![modification])
}
