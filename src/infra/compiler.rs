//! Proto-to-Python code compiler
//!
//! The compiler is an external program (by default
//! `python3 -m grpc_tools.protoc`) run once per package. It writes
//! `*_pb2.py` and `*_pb2_grpc.py` modules into the output directory.

use std::path::{Path, PathBuf};
use std::process::Command;

use walkdir::WalkDir;

use crate::config::defaults::{DEFAULT_COMPILER, GENERATED_SUFFIXES};
use crate::error::CompileError;
use crate::infra::filesystem;

/// Inputs for one compiler invocation
#[derive(Debug, Clone)]
pub struct CompileRequest<'a> {
    /// Directory imports are resolved against
    pub proto_dir: &'a Path,
    /// Definition files, relative to `proto_dir`
    pub proto_files: &'a [String],
    /// Directory receiving generated modules
    pub out_dir: &'a Path,
}

impl CompileRequest<'_> {
    /// Absolute paths of the definition files
    pub fn definition_paths(&self) -> Vec<PathBuf> {
        self.proto_files
            .iter()
            .map(|f| self.proto_dir.join(f))
            .collect()
    }
}

/// What the compiler produced
#[derive(Debug, Clone, Default)]
pub struct CompileOutput {
    /// Generated modules, relative to the output directory, sorted
    pub artifacts: Vec<PathBuf>,
    /// Anything the compiler printed on stderr
    pub diagnostics: String,
}

/// Turns interface definitions into source modules
pub trait CodeCompiler {
    /// Compile the requested definitions into `request.out_dir`
    fn compile(&self, request: &CompileRequest<'_>) -> Result<CompileOutput, CompileError>;

    /// Human-readable description of the compiler
    fn describe(&self) -> String;
}

/// Runs `grpc_tools.protoc` (or a compatible command) as a subprocess
#[derive(Debug, Clone)]
pub struct ProtocCompiler {
    command: Vec<String>,
}

impl Default for ProtocCompiler {
    fn default() -> Self {
        Self::new(DEFAULT_COMPILER.iter().map(|s| (*s).to_string()).collect())
    }
}

impl ProtocCompiler {
    /// Create a compiler from a command line (program followed by fixed arguments)
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    /// Command line
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Program to execute
    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }

    /// Resolve the program on PATH
    pub fn locate(&self) -> Result<PathBuf, CompileError> {
        let program = self.program().ok_or(CompileError::EmptyCommand)?;
        which::which(program).map_err(|_| CompileError::CompilerNotFound {
            program: program.to_string(),
        })
    }

    /// Arguments passed after the fixed command line
    pub fn build_args(request: &CompileRequest<'_>) -> Vec<String> {
        let mut args = vec![
            format!("--proto_path={}", request.proto_dir.display()),
            format!("--python_out={}", request.out_dir.display()),
            format!("--grpc_python_out={}", request.out_dir.display()),
        ];
        args.extend(
            request
                .definition_paths()
                .iter()
                .map(|p| p.display().to_string()),
        );
        args
    }

    /// Report the compiler version, if it can be queried
    pub fn version(&self) -> Option<String> {
        let program = self.locate().ok()?;
        let output = Command::new(program)
            .args(&self.command[1..])
            .arg("--version")
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        let text = String::from_utf8_lossy(&output.stdout);
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

impl CodeCompiler for ProtocCompiler {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<CompileOutput, CompileError> {
        for path in request.definition_paths() {
            if !path.is_file() {
                return Err(CompileError::MissingDefinition { path });
            }
        }

        let program = self.locate()?;
        filesystem::create_dir_all(request.out_dir)?;

        let args = Self::build_args(request);
        tracing::debug!("Running: {} {}", self.command.join(" "), args.join(" "));

        let output = Command::new(&program)
            .args(&self.command[1..])
            .args(&args)
            .output()
            .map_err(|e| CompileError::Spawn {
                program: program.display().to_string(),
                error: e.to_string(),
            })?;

        let diagnostics = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(CompileError::Failed {
                status: output.status.to_string(),
                diagnostics,
            });
        }
        if !diagnostics.is_empty() {
            tracing::warn!("Compiler diagnostics: {diagnostics}");
        }

        Ok(CompileOutput {
            artifacts: scan_generated(request.out_dir)?,
            diagnostics,
        })
    }

    fn describe(&self) -> String {
        self.command.join(" ")
    }
}

/// Generated modules under `out_dir`, relative to it
pub fn scan_generated(out_dir: &Path) -> Result<Vec<PathBuf>, CompileError> {
    let mut artifacts = Vec::new();
    for entry in WalkDir::new(out_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| CompileError::ScanOutput {
            path: out_dir.to_path_buf(),
            error: e.to_string(),
        })?;
        let name = entry.file_name().to_string_lossy();
        if entry.file_type().is_file() && GENERATED_SUFFIXES.iter().any(|s| name.ends_with(s)) {
            if let Ok(relative) = entry.path().strip_prefix(out_dir) {
                artifacts.push(relative.to_path_buf());
            }
        }
    }
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_build_args_layout() {
        let files = vec!["audio-message.proto".to_string()];
        let request = CompileRequest {
            proto_dir: Path::new("/src/proto"),
            proto_files: &files,
            out_dir: Path::new("/out/pkg/pkg"),
        };

        assert_eq!(
            ProtocCompiler::build_args(&request),
            vec![
                "--proto_path=/src/proto",
                "--python_out=/out/pkg/pkg",
                "--grpc_python_out=/out/pkg/pkg",
                "/src/proto/audio-message.proto",
            ]
        );
    }

    #[test]
    fn test_missing_definition_checked_before_spawn() {
        let dir = TempDir::new().unwrap();
        let files = vec!["missing.proto".to_string()];
        let request = CompileRequest {
            proto_dir: dir.path(),
            proto_files: &files,
            out_dir: &dir.path().join("out"),
        };

        let compiler = ProtocCompiler::new(vec!["protopack-no-such-compiler".to_string()]);
        assert!(matches!(
            compiler.compile(&request),
            Err(CompileError::MissingDefinition { .. })
        ));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_unknown_program_reported() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.proto"), "syntax = \"proto3\";").unwrap();
        let files = vec!["a.proto".to_string()];
        let request = CompileRequest {
            proto_dir: dir.path(),
            proto_files: &files,
            out_dir: &dir.path().join("out"),
        };

        let compiler = ProtocCompiler::new(vec!["protopack-no-such-compiler".to_string()]);
        match compiler.compile(&request) {
            Err(CompileError::CompilerNotFound { program }) => {
                assert_eq!(program, "protopack-no-such-compiler");
            }
            other => panic!("expected compiler not found, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_command() {
        let compiler = ProtocCompiler::new(Vec::new());
        assert!(matches!(compiler.locate(), Err(CompileError::EmptyCommand)));
        assert_eq!(compiler.program(), None);
    }

    #[test]
    fn test_scan_generated_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["b_pb2.py", "a_pb2_grpc.py", "a_pb2.py", "__init__.py", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let artifacts = scan_generated(dir.path()).unwrap();
        assert_eq!(
            artifacts,
            vec![
                PathBuf::from("a_pb2.py"),
                PathBuf::from("a_pb2_grpc.py"),
                PathBuf::from("b_pb2.py"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_compiler_captures_stderr() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.proto"), "syntax = \"proto3\";").unwrap();
        let files = vec!["a.proto".to_string()];
        let request = CompileRequest {
            proto_dir: dir.path(),
            proto_files: &files,
            out_dir: &dir.path().join("out"),
        };

        let compiler = ProtocCompiler::new(vec![
            "sh".to_string(),
            "-c".to_string(),
            "echo 'a.proto:1:1: syntax error' >&2; exit 1".to_string(),
            "protoc".to_string(),
        ]);
        match compiler.compile(&request) {
            Err(CompileError::Failed { diagnostics, .. }) => {
                assert_eq!(diagnostics, "a.proto:1:1: syntax error");
            }
            other => panic!("expected compile failure, got {other:?}"),
        }
    }
}
