//! CLI command for `protopack git-setup`
//!
//! Turns each generated package that declares a `repository` into a local
//! git repository with that remote as `origin`.

use anyhow::{bail, Context, Result};

use crate::cli::output::{
    is_json, is_quiet, print_detail, print_error, print_info, print_success, status,
};
use crate::core::config::Settings;
use crate::core::git_setup;
use crate::infra::git::ensure_git;

/// Execute the git-setup command
pub fn execute(settings: &Settings) -> Result<()> {
    let targets = git_setup::plan(&settings.packages, &settings.packages_dir());
    if targets.is_empty() {
        print_info("No packages declare a repository; nothing to set up");
        return Ok(());
    }

    ensure_git().context("git-setup needs git")?;

    let report = git_setup::run(&targets);

    if is_json() {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for result in &report.results {
            match &result.error {
                None => print_success(&format!(
                    "{} ({})",
                    result.package,
                    result.package_dir.display()
                )),
                Some(error) => print_error(&format!("{}: {error}", result.package)),
            }
        }
        if !is_quiet() {
            let prefix = if report.is_success() {
                status::SUCCESS
            } else {
                status::ERROR
            };
            println!();
            println!(
                "{prefix} {}/{} repositories ready",
                report.succeeded(),
                report.attempted()
            );
            if report.is_success() {
                print_detail("Push each package with: git push -u origin HEAD");
            }
        }
    }

    if !report.is_success() {
        bail!(
            "Git setup failed for {} of {} packages",
            report.attempted() - report.succeeded(),
            report.attempted()
        );
    }
    Ok(())
}
