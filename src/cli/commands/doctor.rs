//! CLI command for `protopack doctor`
//!
//! Checks system dependencies and reports issues with suggestions.

use anyhow::{bail, Result};

use crate::cli::build_info;
use crate::cli::output::{
    is_json, is_quiet, print_detail, print_info, print_success, print_warning, status,
};
use crate::core::config::Settings;
use crate::core::doctor::run_doctor;

/// Execute the doctor command
pub fn execute(settings: &Settings) -> Result<()> {
    let report = run_doctor(settings);
    let failed_required = report.failed_required();

    if is_json() {
        let status = if report.all_passed() {
            "success"
        } else if failed_required.is_empty() {
            "warning"
        } else {
            "error"
        };
        let value = serde_json::json!({
            "status": status,
            "version": build_info(),
            "checks": report.checks,
            "config_issues": report.config_issues,
            "passed_count": report.passed_count(),
            "total_count": report.checks.len(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);

        if !failed_required.is_empty() {
            bail!("Missing required dependencies");
        }
        return Ok(());
    }

    if is_quiet() {
        if !failed_required.is_empty() {
            for check in failed_required {
                eprintln!("{} Missing required: {}", status::ERROR, check.name);
            }
            bail!("Missing required dependencies");
        }
        return Ok(());
    }

    print_info(&build_info());
    print_info("Checking system dependencies...");
    println!();

    for check in &report.checks {
        let version_str = check
            .version
            .as_ref()
            .map(|v| format!(" (v{v})"))
            .unwrap_or_default();
        let required_str = if check.required { "" } else { " [optional]" };

        if check.passed {
            println!("  {} {}{version_str}{required_str}", status::SUCCESS, check.name);
        } else {
            println!("  {} {}{required_str}", status::ERROR, check.name);
            if let Some(error) = &check.error {
                print_detail(&format!("Error: {error}"));
            }
            if let Some(suggestion) = &check.suggestion {
                print_detail(&format!("Suggestion: {suggestion}"));
            }
        }
    }

    if !report.config_issues.is_empty() {
        println!();
        print_warning("Configuration issues:");
        for issue in &report.config_issues {
            print_detail(&format!("• {issue}"));
        }
    }

    println!();
    let passed = report.passed_count();
    let total = report.checks.len();

    if report.all_passed() {
        print_success(&format!("All checks passed ({passed}/{total})"));
        print_detail("System is ready for protopack!");
    } else if failed_required.is_empty() {
        print_warning(&format!("{passed}/{total} checks passed"));
        print_detail("Packages can be built; see the issues above.");
    } else {
        println!("{} {passed}/{total} checks passed", status::ERROR);
        print_detail("Please install missing required dependencies:");
        for check in &failed_required {
            if let Some(suggestion) = &check.suggestion {
                print_detail(&format!("• {}: {suggestion}", check.name));
            }
        }
        bail!("Missing required dependencies. Run 'protopack doctor' for details.");
    }

    Ok(())
}
