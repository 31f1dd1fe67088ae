//! Repository bootstrap for generated packages
//!
//! Every package with a `repository` URL gets a local git repository with
//! that URL as `origin`. Packages are handled independently; one failure
//! does not stop the others.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::core::package::PackageSpec;
use crate::infra::git::{self, GitRepository};

/// One package to bootstrap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitTarget {
    /// Package name
    pub package: String,
    /// Package directory
    pub package_dir: PathBuf,
    /// Remote URL
    pub remote_url: String,
}

/// Outcome for one package
#[derive(Debug, Clone, Serialize)]
pub struct GitSetupResult {
    /// Package name
    pub package: String,
    /// Package directory
    pub package_dir: PathBuf,
    /// Whether the repository is ready
    pub success: bool,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome for every package
#[derive(Debug, Clone, Default, Serialize)]
pub struct GitSetupReport {
    /// Per-package results, in table order
    pub results: Vec<GitSetupResult>,
}

impl GitSetupReport {
    /// Number of packages attempted
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    /// Number of packages set up
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    /// Whether every package was set up
    pub fn is_success(&self) -> bool {
        self.succeeded() == self.attempted()
    }
}

/// Packages that declare a repository, in table order
pub fn plan(specs: &[PackageSpec], packages_dir: &Path) -> Vec<GitTarget> {
    specs
        .iter()
        .filter_map(|spec| {
            spec.repository.as_ref().map(|url| GitTarget {
                package: spec.name.clone(),
                package_dir: packages_dir.join(spec.module_name()),
                remote_url: url.clone(),
            })
        })
        .collect()
}

/// Bootstrap every planned package
pub fn run(targets: &[GitTarget]) -> GitSetupReport {
    let mut report = GitSetupReport::default();

    for target in targets {
        tracing::info!("Setting up git repository for {}", target.package);
        let repo = GitRepository::new(&target.package_dir);
        let outcome = git::bootstrap_package(&repo, &target.remote_url);

        if let Err(e) = &outcome {
            tracing::warn!("Git setup failed for {}: {e}", target.package);
        }
        report.results.push(GitSetupResult {
            package: target.package.clone(),
            package_dir: target.package_dir.clone(),
            success: outcome.is_ok(),
            error: outcome.err().map(|e| e.to_string()),
        });
    }

    report
}
