//! Material configuration and fingerprints.
//!
//! A material is a pipeline input: either a source repository or the
//! passed stage of an upstream pipeline. Two configs with the same
//! fingerprint denote the same material, whatever name or destination
//! folder they are declared with.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable identity of a material configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn digest(parts: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update(b"<|>");
        }
        Self(hex::encode(hasher.finalize()))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ScmKind {
    Git,
    Hg,
    Svn,
    P4,
    Tfs,
    Package,
    Plugin,
}

impl ScmKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScmKind::Git => "git",
            ScmKind::Hg => "hg",
            ScmKind::Svn => "svn",
            ScmKind::P4 => "p4",
            ScmKind::Tfs => "tfs",
            ScmKind::Package => "package",
            ScmKind::Plugin => "plugin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ScmMaterialConfig {
    pub kind: ScmKind,
    pub url: String,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub folder: Option<String>,
}

impl ScmMaterialConfig {
    pub fn new(kind: ScmKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            branch: None,
            name: None,
            folder: None,
        }
    }

    pub fn git(url: impl Into<String>) -> Self {
        Self::new(ScmKind::Git, url)
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::digest(&[
            self.kind.as_str(),
            &self.url,
            self.branch.as_deref().unwrap_or(""),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DependencyMaterialConfig {
    pub pipeline: String,
    pub stage: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl DependencyMaterialConfig {
    pub fn new(pipeline: impl Into<String>, stage: impl Into<String>) -> Self {
        Self {
            pipeline: pipeline.into(),
            stage: stage.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::digest(&["dependency", &self.pipeline, &self.stage])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MaterialConfig {
    Scm(ScmMaterialConfig),
    Dependency(DependencyMaterialConfig),
}

impl MaterialConfig {
    pub fn fingerprint(&self) -> Fingerprint {
        match self {
            MaterialConfig::Scm(scm) => scm.fingerprint(),
            MaterialConfig::Dependency(dep) => dep.fingerprint(),
        }
    }

    pub fn is_dependency(&self) -> bool {
        matches!(self, MaterialConfig::Dependency(_))
    }

    pub fn as_dependency(&self) -> Option<&DependencyMaterialConfig> {
        match self {
            MaterialConfig::Dependency(dep) => Some(dep),
            MaterialConfig::Scm(_) => None,
        }
    }

    pub fn as_scm(&self) -> Option<&ScmMaterialConfig> {
        match self {
            MaterialConfig::Scm(scm) => Some(scm),
            MaterialConfig::Dependency(_) => None,
        }
    }

    /// Configured name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            MaterialConfig::Scm(scm) => scm.name.as_deref(),
            MaterialConfig::Dependency(dep) => dep.name.as_deref(),
        }
    }
}

impl From<ScmMaterialConfig> for MaterialConfig {
    fn from(scm: ScmMaterialConfig) -> Self {
        MaterialConfig::Scm(scm)
    }
}

impl From<DependencyMaterialConfig> for MaterialConfig {
    fn from(dep: DependencyMaterialConfig) -> Self {
        MaterialConfig::Dependency(dep)
    }
}

impl fmt::Display for MaterialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterialConfig::Scm(scm) => match &scm.branch {
                Some(branch) => write!(f, "{}: {} [{}]", scm.kind.as_str(), scm.url, branch),
                None => write!(f, "{}: {}", scm.kind.as_str(), scm.url),
            },
            MaterialConfig::Dependency(dep) => {
                write!(f, "pipeline: {} [{}]", dep.pipeline, dep.stage)
            }
        }
    }
}
