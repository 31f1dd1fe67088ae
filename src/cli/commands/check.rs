//! Check command implementation
//!
//! Implements `protopack check` to validate configuration without building.

use anyhow::{bail, Result};

use crate::cli::output::{is_json, is_quiet, print_detail, print_error, status};
use crate::core::check;
use crate::core::config::Settings;
use crate::core::render::TemplateEngine;

/// Execute the check command
pub fn execute(settings: &Settings) -> Result<()> {
    let renderer = TemplateEngine::new(settings.templates_dir.clone());
    let result = check::check(settings, &renderer);

    if is_json() {
        println!("{}", serde_json::to_string_pretty(&result)?);
        if !result.is_valid() {
            bail!("Check failed");
        }
        return Ok(());
    }

    if is_quiet() {
        for error in &result.errors {
            print_error(error);
        }
        if !result.is_valid() {
            bail!("Check failed");
        }
        return Ok(());
    }

    println!("Checking project configuration...\n");

    if result.errors.is_empty() {
        println!("{} Configuration is valid", status::SUCCESS);
    } else {
        println!("{} Configuration has errors", status::ERROR);
        for error in &result.errors {
            print_detail(&format!("- {error}"));
        }
    }

    if result.compiler_available {
        println!(
            "{} Compiler is available ({})",
            status::SUCCESS,
            settings.compiler.join(" ")
        );
    }
    if !result.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &result.warnings {
            println!("  {} {warning}", status::WARNING);
        }
    }

    println!("\nBuild order:");
    if result.build_order.is_empty() {
        println!("  (unresolved)");
    } else {
        for (i, name) in result.build_order.iter().enumerate() {
            println!("  {}. {name}", i + 1);
        }
    }

    println!("\nSettings:");
    println!("  Proto directory: {}", settings.proto_dir.display());
    println!("  Output directory: {}", settings.output_dir.display());
    if let Some(dir) = &settings.templates_dir {
        println!("  Templates directory: {}", dir.display());
    }

    println!();
    if result.is_valid() {
        println!("{} Check passed - ready to build", status::SUCCESS);
        Ok(())
    } else {
        bail!("Check failed - please fix the issues above before building");
    }
}
