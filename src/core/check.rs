//! Check command logic
//!
//! Validates the configuration, resolves the build order and verifies the
//! templates and compiler without building anything.

use serde::Serialize;

use crate::core::builder::BuildOrchestrator;
use crate::core::config::Settings;
use crate::core::render::TemplateRenderer;
use crate::core::resolver::build_order;
use crate::infra::compiler::ProtocCompiler;

/// Result of the check operation
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    /// Packages in table order
    pub packages: Vec<String>,
    /// Build order (empty when the graph does not resolve)
    pub build_order: Vec<String>,
    /// Problems that would stop or fail a build
    pub errors: Vec<String>,
    /// Problems that only matter in some environments
    pub warnings: Vec<String>,
    /// Whether the compiler program is on PATH
    pub compiler_available: bool,
}

impl CheckResult {
    /// Check if all validations passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate `settings` against the given renderer
pub fn check(settings: &Settings, renderer: &dyn TemplateRenderer) -> CheckResult {
    let mut result = CheckResult {
        packages: settings.packages.iter().map(|s| s.name.clone()).collect(),
        ..CheckResult::default()
    };

    result
        .errors
        .extend(settings.check().iter().map(ToString::to_string));

    if let Ok(order) = build_order(&settings.packages) {
        result.build_order = order.iter().map(|s| s.name.clone()).collect();
    }

    result.errors.extend(
        settings
            .missing_proto_files()
            .iter()
            .map(ToString::to_string),
    );

    if let Err(e) = renderer.verify(&BuildOrchestrator::required_templates(&settings.packages)) {
        result.errors.push(e.to_string());
    }

    let compiler = ProtocCompiler::new(settings.compiler.clone());
    match compiler.locate() {
        Ok(_) => result.compiler_available = true,
        Err(e) => result.warnings.push(e.to_string()),
    }

    tracing::debug!(
        "Check finished with {} errors, {} warnings",
        result.errors.len(),
        result.warnings.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::default_packages;
    use crate::core::package::{PackageRole, PackageSpec};
    use crate::core::render::TemplateEngine;
    use tempfile::TempDir;

    fn settings_in(dir: &TempDir, packages: Vec<PackageSpec>) -> Settings {
        Settings {
            proto_dir: dir.path().join("proto"),
            output_dir: dir.path().join("out"),
            templates_dir: None,
            compiler: vec!["definitely-not-a-real-compiler-xyz".to_string()],
            packages,
        }
    }

    fn write_protos(dir: &TempDir) {
        let proto = dir.path().join("proto");
        std::fs::create_dir_all(&proto).unwrap();
        for file in [
            "audio-message.proto",
            "transcribe-interface.proto",
            "clone-interface.proto",
        ] {
            std::fs::write(proto.join(file), "syntax = \"proto3\";\n").unwrap();
        }
    }

    #[test]
    fn test_check_default_table() {
        let dir = TempDir::new().unwrap();
        write_protos(&dir);
        let settings = settings_in(&dir, default_packages());

        let result = check(&settings, &TemplateEngine::builtin());
        assert!(result.is_valid(), "unexpected errors: {:?}", result.errors);
        assert_eq!(result.build_order[0], "AudioMessages");
        assert_eq!(result.build_order.len(), 5);
        assert!(!result.compiler_available);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_check_reports_missing_proto_files() {
        let dir = TempDir::new().unwrap();
        let settings = settings_in(&dir, default_packages());

        let result = check(&settings, &TemplateEngine::builtin());
        assert!(!result.is_valid());
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("missing proto file")));
    }

    #[test]
    fn test_check_reports_cycle_without_order() {
        let dir = TempDir::new().unwrap();
        write_protos(&dir);
        let specs = vec![
            PackageSpec::new("A", PackageRole::Messages, &["audio-message.proto"])
                .depends_on("B"),
            PackageSpec::new("B", PackageRole::Messages, &["clone-interface.proto"]).depends_on("A"),
        ];

        let result = check(&settings_in(&dir, specs), &TemplateEngine::builtin());
        assert!(result.build_order.is_empty());
        assert!(result.errors.iter().any(|e| e.contains("Circular")));
    }
}
