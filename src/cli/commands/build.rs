//! Build command implementation
//!
//! Implements `protopack build` to generate every package in the table.

use anyhow::{bail, Context, Result};
use indicatif::ProgressBar;

use crate::cli::output::{
    create_build_bar, is_json, is_quiet, print_detail, print_error, print_info, print_success,
    status,
};
use crate::core::builder::{BuildObserver, BuildOrchestrator};
use crate::core::config::Settings;
use crate::core::package::PackageSpec;
use crate::core::render::TemplateEngine;
use crate::core::report::{BuildReport, BuildResult};
use crate::infra::compiler::{CodeCompiler, ProtocCompiler};

/// Progress bar driven by build notifications
struct ProgressObserver {
    bar: ProgressBar,
}

impl BuildObserver for ProgressObserver {
    fn package_started(&self, spec: &PackageSpec, _index: usize, _total: usize) {
        self.bar.set_message(spec.name.clone());
    }

    fn package_finished(&self, result: &BuildResult) {
        if !result.success {
            let stage = result
                .failed_stage
                .map_or_else(String::new, |s| format!(" at {s}"));
            self.bar
                .println(format!("{} {} failed{stage}", status::ERROR, result.package));
        }
        self.bar.inc(1);
    }
}

/// Execute the build command
pub fn execute(settings: &Settings) -> Result<()> {
    settings.validate().context("Invalid configuration")?;

    let compiler = ProtocCompiler::new(settings.compiler.clone());
    let renderer = TemplateEngine::new(settings.templates_dir.clone());

    tracing::info!("Using compiler: {}", compiler.describe());
    print_info(&format!(
        "Building {} packages into {}",
        settings.packages.len(),
        settings.output_dir.display()
    ));

    let observer = ProgressObserver {
        bar: create_build_bar(settings.packages.len() as u64),
    };
    let report = BuildOrchestrator::new(
        &compiler,
        &renderer,
        &settings.proto_dir,
        &settings.output_dir,
    )
    .with_observer(&observer)
    .run(&settings.packages)
    .context("Build could not start")?;
    observer.bar.finish_and_clear();

    if is_json() {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if !report.is_success() {
        bail!(
            "{} of {} packages failed to build",
            report.failed().len(),
            report.attempted()
        );
    }
    Ok(())
}

fn print_report(report: &BuildReport) {
    for result in &report.results {
        if result.success {
            print_success(&format!(
                "{} ({} files)",
                result.package,
                result.artifacts.len()
            ));
        }
    }

    let failed = report.failed();
    for result in &failed {
        let stage = result
            .failed_stage
            .map_or_else(|| "unknown".to_string(), |s| s.to_string());
        print_error(&format!(
            "{} failed at {stage}: {}",
            result.package,
            result.error.as_deref().unwrap_or("unknown error")
        ));
    }

    if is_quiet() {
        return;
    }

    println!();
    let prefix = if failed.is_empty() {
        status::SUCCESS
    } else {
        status::ERROR
    };
    println!(
        "{prefix} Built {}/{} packages",
        report.succeeded(),
        report.attempted()
    );

    if failed.is_empty() {
        println!();
        print_info("Install a package into a uv project with:");
        for result in &report.results {
            print_detail(&format!("uv add --editable {}", result.package_dir.display()));
        }
    }
}
