//! Revisions, modifications, and material revisions.

use crate::ids::ModificationId;
use crate::material::{Fingerprint, MaterialConfig};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One observed change of a material, as recorded against a pipeline instance.
///
/// Revisions are totally ordered by modification time, then by modification id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct Revision {
    pub modified_at: DateTime<Utc>,
    pub id: ModificationId,
    pub revision: String,
}

impl Revision {
    pub fn new(revision: impl Into<String>, modified_at: DateTime<Utc>, id: ModificationId) -> Self {
        Self {
            modified_at,
            id,
            revision: revision.into(),
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.revision, self.modified_at.to_rfc3339())
    }
}

/// A recorded change of a material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Modification {
    pub id: ModificationId,
    pub revision: String,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    /// Label of the upstream pipeline instance, for dependency materials.
    #[serde(default)]
    pub pipeline_label: Option<String>,
}

impl Modification {
    pub fn new(id: ModificationId, revision: impl Into<String>, modified_at: DateTime<Utc>) -> Self {
        Self {
            id,
            revision: revision.into(),
            modified_at,
            user_name: None,
            comment: None,
            pipeline_label: None,
        }
    }

    pub fn to_revision(&self) -> Revision {
        Revision::new(self.revision.clone(), self.modified_at, self.id)
    }
}

/// A material together with the modifications a build uses, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MaterialRevision {
    pub material: MaterialConfig,
    pub modifications: Vec<Modification>,
}

impl MaterialRevision {
    pub fn new(material: MaterialConfig, modifications: Vec<Modification>) -> Self {
        Self {
            material,
            modifications,
        }
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.material.fingerprint()
    }

    pub fn latest_modification(&self) -> Option<&Modification> {
        self.modifications.first()
    }

    pub fn latest_revision(&self) -> Option<Revision> {
        self.latest_modification().map(Modification::to_revision)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct MaterialRevisions(Vec<MaterialRevision>);

impl MaterialRevisions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, revision: MaterialRevision) {
        self.0.push(revision);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MaterialRevision> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Find the revision recorded for a material fingerprint.
    pub fn find(&self, fingerprint: &Fingerprint) -> Option<&MaterialRevision> {
        self.0.iter().find(|mr| &mr.fingerprint() == fingerprint)
    }

    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.find(fingerprint).is_some()
    }
}

impl From<Vec<MaterialRevision>> for MaterialRevisions {
    fn from(revisions: Vec<MaterialRevision>) -> Self {
        Self(revisions)
    }
}

impl FromIterator<MaterialRevision> for MaterialRevisions {
    fn from_iter<I: IntoIterator<Item = MaterialRevision>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for MaterialRevisions {
    type Item = MaterialRevision;
    type IntoIter = std::vec::IntoIter<MaterialRevision>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MaterialRevisions {
    type Item = &'a MaterialRevision;
    type IntoIter = std::slice::Iter<'a, MaterialRevision>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
