//! CLI command for displaying dependency tree
//!
//! Implements the `protopack tree` command.

use anyhow::{bail, Result};

use crate::core::config::Settings;
use crate::core::tree::DependencyTree;

/// Execute the tree command
pub fn execute(settings: &Settings, package: Option<&str>, graph: bool) -> Result<()> {
    let tree = DependencyTree::from_specs(&settings.packages);

    let output = if graph {
        tree.format_dot()
    } else if let Some(name) = package {
        match tree.format_tree_for_package(name) {
            Some(text) => text,
            None => bail!("Package '{name}' not found in package table"),
        }
    } else {
        tree.format_tree()
    };

    println!("{output}");
    Ok(())
}
