//! CLI implementation for `protopack init` command
//!
//! This module handles the CLI interface for project initialization.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{print_detail, print_success};
use crate::core::init::init_project;

/// Execute the init command
pub fn execute(path: &Path, force: bool) -> Result<()> {
    let result = init_project(path, force).context("Failed to initialize project")?;

    print_success(&format!("Initialized protopack project in {}", path.display()));
    print_detail(&format!("Created {}", result.config_path.display()));
    if result.proto_dir_created {
        print_detail("Created directory: proto/");
    }
    if result.gitignore_existed {
        print_detail("Updated .gitignore");
    } else {
        print_detail("Created .gitignore");
    }

    Ok(())
}
