//! Build results and reports
//!
//! A [`BuildResult`] records what happened to one package; a [`BuildReport`]
//! aggregates them in build order. The process exit status is derived from
//! the report alone.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Assembly stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Package directory layout
    Skeleton,
    /// Code compiler invocation
    Compile,
    /// Pruning and reference qualification
    Rewrite,
    /// Role-specific source files
    Render,
    /// `pyproject.toml`
    Manifest,
    /// README
    Docs,
}

impl Stage {
    /// Stage name as shown to users
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skeleton => "skeleton",
            Self::Compile => "compile",
            Self::Rewrite => "rewrite",
            Self::Render => "render",
            Self::Manifest => "manifest",
            Self::Docs => "docs",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an artifact came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Written by the code compiler
    Compiled,
    /// Compiler output with qualified imports
    Rewritten,
    /// Produced from a template
    Rendered,
}

/// Files produced for one package, keyed by path relative to the package
/// directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GeneratedArtifactSet {
    artifacts: BTreeMap<String, ArtifactKind>,
}

impl GeneratedArtifactSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an artifact, replacing any earlier entry for the same path
    pub fn insert(&mut self, relative: &Path, kind: ArtifactKind) {
        self.artifacts.insert(normalize(relative), kind);
    }

    /// Forget an artifact
    pub fn remove(&mut self, relative: &Path) -> Option<ArtifactKind> {
        self.artifacts.remove(&normalize(relative))
    }

    /// Kind of the artifact at a path
    pub fn get(&self, relative: &str) -> Option<ArtifactKind> {
        self.artifacts.get(relative).copied()
    }

    /// Whether a path is recorded
    pub fn contains(&self, relative: &str) -> bool {
        self.artifacts.contains_key(relative)
    }

    /// Number of artifacts
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Artifacts in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, ArtifactKind)> {
        self.artifacts.iter().map(|(path, kind)| (path.as_str(), *kind))
    }

    /// SHA-256 over every (path, content) pair, in path order
    pub fn fingerprint(&self, package_dir: &Path) -> Result<String, FilesystemError> {
        let mut hasher = Sha256::new();
        for path in self.artifacts.keys() {
            let content = filesystem::read_file(&package_dir.join(path))?;
            hasher.update(path.as_bytes());
            hasher.update([0u8]);
            hasher.update(content.as_bytes());
            hasher.update([0u8]);
        }
        Ok(hex::encode(hasher.finalize()))
    }
}

fn normalize(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Outcome of assembling one package
#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    /// Package name
    pub package: String,
    /// Package directory
    pub package_dir: PathBuf,
    /// Whether every stage completed
    pub success: bool,
    /// Files produced (complete only on success)
    pub artifacts: GeneratedArtifactSet,
    /// Stage that failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BuildResult {
    /// A successful result
    pub fn succeeded(package: &str, package_dir: PathBuf, artifacts: GeneratedArtifactSet) -> Self {
        Self {
            package: package.to_string(),
            package_dir,
            success: true,
            artifacts,
            failed_stage: None,
            error: None,
        }
    }

    /// A failed result
    pub fn failed(
        package: &str,
        package_dir: PathBuf,
        artifacts: GeneratedArtifactSet,
        stage: Stage,
        error: impl fmt::Display,
    ) -> Self {
        Self {
            package: package.to_string(),
            package_dir,
            success: false,
            artifacts,
            failed_stage: Some(stage),
            error: Some(error.to_string()),
        }
    }
}

/// Results of a whole build, in build order
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    /// Output root
    pub output_dir: PathBuf,
    /// Per-package results
    pub results: Vec<BuildResult>,
}

impl BuildReport {
    /// Create an empty report for an output root
    pub fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            results: Vec::new(),
        }
    }

    /// Record a result
    pub fn push(&mut self, result: BuildResult) {
        self.results.push(result);
    }

    /// Number of packages attempted
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    /// Number of packages that assembled
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Failed results
    pub fn failed(&self) -> Vec<&BuildResult> {
        self.results.iter().filter(|r| !r.success).collect()
    }

    /// Whether every attempted package assembled
    pub fn is_success(&self) -> bool {
        self.succeeded() == self.attempted()
    }

    /// Result for a package
    pub fn result(&self, package: &str) -> Option<&BuildResult> {
        self.results.iter().find(|r| r.package == package)
    }

    /// Process exit code for this report
    pub fn exit_code(&self) -> i32 {
        i32::from(!self.is_success())
    }
}
