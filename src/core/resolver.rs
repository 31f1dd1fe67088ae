//! Dependency resolution
//!
//! Computes the package build order and detects dependency problems.
//! The sort is stable: packages keep their table order unless a dependency
//! has to be built first.

use std::collections::{HashMap, HashSet};

use crate::core::package::PackageSpec;
use crate::error::ResolverError;

/// Dependency graph for packages
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Adjacency list: package -> dependencies
    edges: HashMap<String, Vec<String>>,
    /// Packages in insertion order
    nodes: Vec<String>,
    /// Names added more than once
    duplicates: Vec<String>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a package table
    pub fn from_specs(specs: &[PackageSpec]) -> Self {
        let mut graph = Self::new();
        for spec in specs {
            graph.add_package(&spec.name, spec.dependencies.clone());
        }
        graph
    }

    /// Add a package to the graph
    pub fn add_package(&mut self, name: &str, dependencies: Vec<String>) {
        if self.edges.contains_key(name) {
            self.duplicates.push(name.to_string());
            return;
        }
        self.nodes.push(name.to_string());
        self.edges.insert(name.to_string(), dependencies);
    }

    /// Direct dependencies of a package
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.edges.get(name).map_or(&[], Vec::as_slice)
    }

    /// Packages that directly depend on `name`, in insertion order
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|node| self.dependencies_of(node).iter().any(|d| d == name))
            .map(String::as_str)
            .collect()
    }

    /// Compute topological sort (build order)
    ///
    /// Returns packages in order such that dependencies come before dependents.
    pub fn topological_sort(&self) -> Result<Vec<String>, ResolverError> {
        if let Some(name) = self.duplicates.first() {
            return Err(ResolverError::DuplicatePackage { name: name.clone() });
        }

        for node in &self.nodes {
            for dep in self.dependencies_of(node) {
                if !self.edges.contains_key(dep) {
                    return Err(ResolverError::MissingDependency {
                        package: node.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        let mut visited = HashSet::new();
        let mut temp_visited = HashSet::new();
        let mut result = Vec::new();
        let mut cycle_path = Vec::new();

        for node in &self.nodes {
            if !visited.contains(node) {
                self.visit(
                    node,
                    &mut visited,
                    &mut temp_visited,
                    &mut result,
                    &mut cycle_path,
                )?;
            }
        }

        Ok(result)
    }

    fn visit(
        &self,
        node: &str,
        visited: &mut HashSet<String>,
        temp_visited: &mut HashSet<String>,
        result: &mut Vec<String>,
        cycle_path: &mut Vec<String>,
    ) -> Result<(), ResolverError> {
        if temp_visited.contains(node) {
            cycle_path.push(node.to_string());
            let start = cycle_path.iter().position(|n| n == node).unwrap_or(0);
            return Err(ResolverError::CircularDependency {
                cycle: cycle_path[start..].to_vec(),
            });
        }

        if visited.contains(node) {
            return Ok(());
        }

        temp_visited.insert(node.to_string());
        cycle_path.push(node.to_string());

        for dep in self.dependencies_of(node) {
            self.visit(dep, visited, temp_visited, result, cycle_path)?;
        }

        cycle_path.pop();
        temp_visited.remove(node);
        visited.insert(node.to_string());
        result.push(node.to_string());

        Ok(())
    }

    /// Check if the graph has any cycles
    pub fn has_cycle(&self) -> bool {
        matches!(
            self.topological_sort(),
            Err(ResolverError::CircularDependency { .. })
        )
    }
}

/// Order a package table so every package follows its dependencies
pub fn build_order(specs: &[PackageSpec]) -> Result<Vec<&PackageSpec>, ResolverError> {
    let order = DependencyGraph::from_specs(specs).topological_sort()?;
    let by_name: HashMap<&str, &PackageSpec> =
        specs.iter().map(|s| (s.name.as_str(), s)).collect();

    Ok(order
        .iter()
        .filter_map(|name| by_name.get(name.as_str()).copied())
        .collect())
}
