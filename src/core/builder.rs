//! Build orchestration logic
//!
//! Coordinates the build across every package in the table: resolves the
//! build order, checks templates up front, then assembles each package in
//! turn. A failing package never stops the ones after it.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::defaults::PACKAGES_SUBDIR;
use crate::core::assembler::PackageAssembler;
use crate::core::package::PackageSpec;
use crate::core::render::{TemplateId, TemplateRenderer};
use crate::core::report::{BuildReport, BuildResult};
use crate::core::resolver::build_order;
use crate::error::ProtopackError;
use crate::infra::compiler::CodeCompiler;
use crate::infra::filesystem;

/// Receives progress notifications during a build
pub trait BuildObserver {
    /// Called before a package is assembled
    fn package_started(&self, _spec: &PackageSpec, _index: usize, _total: usize) {}

    /// Called after a package is assembled
    fn package_finished(&self, _result: &BuildResult) {}
}

/// Build orchestrator state
pub struct BuildOrchestrator<'a> {
    compiler: &'a dyn CodeCompiler,
    renderer: &'a dyn TemplateRenderer,
    proto_dir: PathBuf,
    output_dir: PathBuf,
    observer: Option<&'a dyn BuildObserver>,
}

impl<'a> BuildOrchestrator<'a> {
    /// Create a new build orchestrator
    pub fn new(
        compiler: &'a dyn CodeCompiler,
        renderer: &'a dyn TemplateRenderer,
        proto_dir: &Path,
        output_dir: &Path,
    ) -> Self {
        Self {
            compiler,
            renderer,
            proto_dir: proto_dir.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            observer: None,
        }
    }

    /// Set a progress observer
    #[must_use]
    pub fn with_observer(mut self, observer: &'a dyn BuildObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Output root
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Templates the table needs, deduplicated
    pub fn required_templates(specs: &[PackageSpec]) -> Vec<TemplateId> {
        specs
            .iter()
            .flat_map(|spec| TemplateId::required_for(spec.role, spec.family))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Build every package
    ///
    /// Fails only on configuration errors (package fields, dependency graph,
    /// templates) and when the output root cannot be created. Package
    /// failures are recorded in the report.
    pub fn run(&self, specs: &[PackageSpec]) -> Result<BuildReport, ProtopackError> {
        for spec in specs {
            spec.validate()?;
        }
        let order = build_order(specs)?;
        tracing::info!(
            "Build order: {}",
            order
                .iter()
                .map(|s| s.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        self.renderer.verify(&Self::required_templates(specs))?;

        filesystem::create_dir_all(&self.output_dir)?;
        filesystem::create_dir_all(&self.output_dir.join(PACKAGES_SUBDIR))?;

        let assembler =
            PackageAssembler::new(self.compiler, self.renderer, &self.proto_dir, &self.output_dir);
        let mut report = BuildReport::new(self.output_dir.clone());
        let total = order.len();

        for (index, spec) in order.iter().enumerate() {
            if let Some(observer) = self.observer {
                observer.package_started(spec, index, total);
            }

            let dependencies: Vec<&PackageSpec> = spec
                .dependencies
                .iter()
                .filter_map(|name| specs.iter().find(|s| &s.name == name))
                .collect();

            if let Some(failed) = dependencies
                .iter()
                .find(|dep| report.result(&dep.name).is_some_and(|r| !r.success))
            {
                tracing::warn!(
                    "{} depends on {}, which failed; attempting anyway",
                    spec.name,
                    failed.name
                );
            }

            let result = assembler.assemble(spec, &dependencies);
            if let Some(observer) = self.observer {
                observer.package_finished(&result);
            }
            report.push(result);
        }

        tracing::info!(
            "Build complete: {}/{} packages",
            report.succeeded(),
            report.attempted()
        );
        Ok(report)
    }
}
