//! Doctor command logic
//!
//! Checks the code compiler, git and the project configuration, and reports
//! issues with suggestions.

use serde::Serialize;

use crate::core::builder::BuildOrchestrator;
use crate::core::config::Settings;
use crate::core::render::{TemplateEngine, TemplateRenderer};
use crate::infra::compiler::ProtocCompiler;

/// Result of a single dependency check
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    /// Name of the dependency being checked
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Version if available
    pub version: Option<String>,
    /// Error message if check failed
    pub error: Option<String>,
    /// Suggestion for fixing the issue
    pub suggestion: Option<String>,
    /// Whether this is a required or optional dependency
    pub required: bool,
}

impl CheckResult {
    /// Create a passing check result
    pub fn pass(name: &str, version: Option<String>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            version,
            error: None,
            suggestion: None,
            required,
        }
    }

    /// Create a failing check result
    pub fn fail(name: &str, error: &str, suggestion: Option<&str>, required: bool) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            version: None,
            error: Some(error.to_string()),
            suggestion: suggestion.map(String::from),
            required,
        }
    }
}

/// Overall doctor report
#[derive(Debug, Default, Serialize)]
pub struct DoctorReport {
    /// Individual check results
    pub checks: Vec<CheckResult>,
    /// Configuration issues found
    pub config_issues: Vec<String>,
}

impl DoctorReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a check result
    pub fn add_check(&mut self, result: CheckResult) {
        self.checks.push(result);
    }

    /// Add a configuration issue
    pub fn add_config_issue(&mut self, issue: String) {
        self.config_issues.push(issue);
    }

    /// Check if all required checks passed
    pub fn all_required_passed(&self) -> bool {
        self.checks
            .iter()
            .filter(|c| c.required)
            .all(|c| c.passed)
    }

    /// Check if all checks passed (including optional)
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed) && self.config_issues.is_empty()
    }

    /// Count passed checks
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|c| c.passed).count()
    }

    /// Count failed checks
    pub fn failed_count(&self) -> usize {
        self.checks.iter().filter(|c| !c.passed).count()
    }

    /// Get all failed required checks
    pub fn failed_required(&self) -> Vec<&CheckResult> {
        self.checks
            .iter()
            .filter(|c| c.required && !c.passed)
            .collect()
    }
}

/// Check if a command is available in PATH, returning its version
pub fn check_command_available(command: &str) -> Option<String> {
    which::which(command).ok()?;
    std::process::Command::new(command)
        .arg("--version")
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                extract_version(&format!("{stdout}{stderr}"))
            } else {
                None
            }
        })
}

/// Extract version string from command output
fn extract_version(output: &str) -> Option<String> {
    let version_regex = regex::Regex::new(r"v?(\d+\.\d+(?:\.\d+)?(?:-\w+)?)").ok()?;
    version_regex
        .captures(output)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Check the configured code compiler
pub fn check_compiler(compiler: &ProtocCompiler) -> CheckResult {
    let name = format!("Code compiler ({})", compiler.command().join(" "));
    match compiler.locate() {
        Ok(path) => {
            tracing::debug!("Compiler found at {}", path.display());
            let version = compiler.version().and_then(|v| extract_version(&v));
            CheckResult::pass(&name, version, true)
        }
        Err(e) => CheckResult::fail(
            &name,
            &e.to_string(),
            Some("Install grpcio-tools (pip install grpcio-tools) or set [build].compiler in protopack.toml"),
            true,
        ),
    }
}

/// Check Git availability (needed only by `git-setup`)
pub fn check_git() -> CheckResult {
    match check_command_available("git") {
        Some(version) => CheckResult::pass("Git", Some(version), false),
        None => CheckResult::fail(
            "Git",
            "Git not found in PATH",
            Some("Install Git from https://git-scm.com/ to use 'protopack git-setup' (optional)"),
            false,
        ),
    }
}

/// Collect configuration problems: package table, proto files, templates
pub fn check_project_config(settings: &Settings, renderer: &TemplateEngine) -> Vec<String> {
    let mut issues: Vec<String> = settings.check().iter().map(ToString::to_string).collect();

    issues.extend(
        settings
            .missing_proto_files()
            .iter()
            .map(ToString::to_string),
    );

    if let Err(e) = renderer.verify(&BuildOrchestrator::required_templates(&settings.packages)) {
        issues.push(e.to_string());
    }

    issues
}

/// Run all doctor checks
pub fn run_doctor(settings: &Settings) -> DoctorReport {
    let mut report = DoctorReport::new();

    report.add_check(check_compiler(&ProtocCompiler::new(settings.compiler.clone())));
    report.add_check(check_git());

    let renderer = TemplateEngine::new(settings.templates_dir.clone());
    for issue in check_project_config(settings, &renderer) {
        report.add_config_issue(issue);
    }

    report
}
