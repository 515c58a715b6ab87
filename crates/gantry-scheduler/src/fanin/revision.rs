//! Value types compared during reconciliation.

use gantry_core::ids::StageIdentifier;
use gantry_core::material::Fingerprint;
use gantry_core::revision::Revision;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

/// An SCM material at the revision observed through one upstream stage run.
///
/// Equality, ordering and hashing look at the fingerprint only, so a set of
/// these holds at most one revision per material. Use
/// [`FaninScmMaterial::same_revision_as`] to compare revisions.
#[derive(Debug, Clone)]
pub struct FaninScmMaterial {
    pub fingerprint: Fingerprint,
    pub revision: Revision,
}

impl FaninScmMaterial {
    pub fn new(fingerprint: Fingerprint, revision: Revision) -> Self {
        Self {
            fingerprint,
            revision,
        }
    }

    pub fn same_revision_as(&self, other: &FaninScmMaterial) -> bool {
        self.revision == other.revision
    }
}

impl PartialEq for FaninScmMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for FaninScmMaterial {}

impl PartialOrd for FaninScmMaterial {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FaninScmMaterial {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fingerprint.cmp(&other.fingerprint)
    }
}

impl Hash for FaninScmMaterial {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

impl Borrow<Fingerprint> for FaninScmMaterial {
    fn borrow(&self) -> &Fingerprint {
        &self.fingerprint
    }
}

/// SCM revisions reachable from one upstream stage run, one per fingerprint.
/// Look a material up with `set.get(&fingerprint)`.
pub type ScmRevisionSet = BTreeSet<FaninScmMaterial>;

/// A stage run paired with one SCM revision it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageScmRevision {
    pub stage: StageIdentifier,
    pub material: FaninScmMaterial,
}

impl StageScmRevision {
    pub fn new(stage: StageIdentifier, material: FaninScmMaterial) -> Self {
        Self { stage, material }
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.material.fingerprint
    }

    pub fn revision(&self) -> &Revision {
        &self.material.revision
    }
}
