//! Fan-in graph nodes.
//!
//! Nodes live in an arena keyed by material fingerprint and refer to their
//! children by fingerprint, so shared upstream sub-graphs are stored once.

use gantry_core::material::{DependencyMaterialConfig, Fingerprint, ScmMaterialConfig};
use std::collections::BTreeSet;

/// A source repository. Always a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScmNode {
    pub material: ScmMaterialConfig,
}

/// An upstream pipeline stage, or the synthetic node of the pipeline being
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    pub material: DependencyMaterialConfig,
    /// Direct materials of the upstream pipeline, in declaration order.
    pub children: Vec<Fingerprint>,
    /// SCM fingerprints reachable through any child.
    pub reachable_scm: BTreeSet<Fingerprint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FanInNode {
    Scm(ScmNode),
    Dependency(DependencyNode),
}

impl FanInNode {
    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            FanInNode::Scm(node) => node.material.fingerprint(),
            FanInNode::Dependency(node) => node.material.fingerprint(),
        }
    }

    pub fn children(&self) -> &[Fingerprint] {
        match self {
            FanInNode::Scm(_) => &[],
            FanInNode::Dependency(node) => &node.children,
        }
    }

    pub fn as_dependency(&self) -> Option<&DependencyNode> {
        match self {
            FanInNode::Dependency(node) => Some(node),
            FanInNode::Scm(_) => None,
        }
    }

    pub fn is_scm(&self) -> bool {
        matches!(self, FanInNode::Scm(_))
    }
}
