//! Dependency tree visualization
//!
//! Displays the package table as a tree (each package with the packages it
//! depends on) or exports it in DOT graph format.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::core::package::{PackageRole, PackageSpec};
use crate::core::resolver::DependencyGraph;

/// Dependency tree structure
#[derive(Debug, Default)]
pub struct DependencyTree {
    /// Packages in table order, with role
    packages: Vec<(String, PackageRole)>,
    /// Dependency graph
    graph: DependencyGraph,
}

impl DependencyTree {
    /// Build the tree from a package table
    pub fn from_specs(specs: &[PackageSpec]) -> Self {
        Self {
            packages: specs.iter().map(|s| (s.name.clone(), s.role)).collect(),
            graph: DependencyGraph::from_specs(specs),
        }
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Whether a package is in the table
    pub fn contains(&self, package: &str) -> bool {
        self.packages.iter().any(|(name, _)| name == package)
    }

    fn role(&self, package: &str) -> Option<PackageRole> {
        self.packages
            .iter()
            .find(|(name, _)| name == package)
            .map(|(_, role)| *role)
    }

    /// Format as tree string
    pub fn format_tree(&self) -> String {
        if self.is_empty() {
            return "No packages configured".to_string();
        }

        let mut output = String::from("Dependency Tree:\n");
        let count = self.packages.len();
        for (i, (name, _)) in self.packages.iter().enumerate() {
            self.format_node(&mut output, name, "", i == count - 1, &mut HashSet::new());
        }
        output
    }

    /// Format tree for a specific package
    pub fn format_tree_for_package(&self, package: &str) -> Option<String> {
        if !self.contains(package) {
            return None;
        }

        let mut output = format!("Dependencies for '{package}':\n");
        self.format_node(&mut output, package, "", true, &mut HashSet::new());

        let dependents = self.graph.dependents_of(package);
        if !dependents.is_empty() {
            let _ = writeln!(output, "\nRequired by: {}", dependents.join(", "));
        }
        Some(output)
    }

    fn format_node(
        &self,
        output: &mut String,
        node: &str,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<String>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        let label = match self.role(node) {
            Some(role) => format!("{node} [{role}]"),
            None => format!("{node} [missing]"),
        };
        let _ = writeln!(output, "{prefix}{connector}{label}");

        // Already on the current path, stop before looping
        if !visited.insert(node.to_string()) {
            return;
        }

        let deps = self.graph.dependencies_of(node);
        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };
        for (i, dep) in deps.iter().enumerate() {
            self.format_node(output, dep, &child_prefix, i == deps.len() - 1, visited);
        }

        visited.remove(node);
    }

    /// Format as DOT graph
    pub fn format_dot(&self) -> String {
        let mut output = String::new();
        output.push_str("digraph dependencies {\n");
        output.push_str("    rankdir=TB;\n");
        output.push_str("    node [shape=box];\n");
        output.push('\n');

        for (name, role) in &self.packages {
            let _ = writeln!(output, "    \"{name}\" [label=\"{name}\\n({role})\"];");
        }
        output.push('\n');

        for (name, _) in &self.packages {
            for dep in self.graph.dependencies_of(name) {
                let _ = writeln!(output, "    \"{name}\" -> \"{dep}\";");
            }
        }

        output.push_str("}\n");
        output
    }
}
