//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests: a temporary
//! project directory, a Rust fake compiler for library-level builds and a
//! shell fake compiler for driving the binary.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use protopack::error::CompileError;
use protopack::infra::compiler::{CodeCompiler, CompileOutput, CompileRequest};
use tempfile::TempDir;

/// Proto files used by the default package table
pub const DEFAULT_PROTO_FILES: &[&str] = &[
    "audio-message.proto",
    "transcribe-interface.proto",
    "clone-interface.proto",
];

/// Test project context
///
/// Creates a temporary directory for test projects and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Project with `proto/` holding the default definition files
    pub fn with_default_protos() -> Self {
        let project = Self::new();
        for file in DEFAULT_PROTO_FILES {
            project.create_file(&format!("proto/{file}"), "syntax = \"proto3\";\n");
        }
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Write the shell fake compiler and a protopack.toml that uses it
    #[cfg(unix)]
    pub fn with_shell_compiler(&self, extra_config: &str) -> PathBuf {
        let script = self.dir.path().join("fake-protoc.sh");
        std::fs::write(&script, FAKE_PROTOC_SCRIPT).expect("Failed to write fake compiler");
        self.create_file(
            "protopack.toml",
            &format!(
                "[build]\ncompiler = [\"sh\", \"{}\"]\n{extra_config}",
                script.display()
            ),
        );
        script
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the protopack binary in `dir` with a clean override environment
pub fn run_protopack(dir: &Path, args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_protopack"));
    cmd.current_dir(dir)
        .env_remove("OUTPUT_DIR")
        .env_remove("PROTO_DIR")
        .env_remove("PROTOPACK_TEMPLATES_DIR");
    for arg in args {
        cmd.arg(arg);
    }
    cmd.output().expect("Failed to execute protopack")
}

/// Stdout and stderr of a run, joined
pub fn combined_output(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

/// Shell stand-in for `grpc_tools.protoc`
///
/// Writes `<name>_pb2.py` per definition. Service definitions also get
/// `<name>_pb2_grpc.py`, an import of `audio_message_pb2` and a copy of the
/// base module, the way the real compiler behaves when a definition imports
/// another. Definitions whose name contains `broken` fail with a diagnostic.
pub const FAKE_PROTOC_SCRIPT: &str = r#"#!/bin/sh
out=""
for arg in "$@"; do
  case "$arg" in
    --version) echo "libprotoc 25.1"; exit 0 ;;
    --python_out=*) out="${arg#--python_out=}" ;;
    --*) ;;
    *.proto)
      name=$(basename "$arg" .proto | tr '-' '_')
      case "$name" in
        *broken*) echo "$arg:1:1: Expected top-level statement" >&2; exit 1 ;;
      esac
      if [ "$name" = "audio_message" ]; then
        printf 'DESCRIPTOR = "audio_message"\n' > "$out/${name}_pb2.py"
      else
        printf 'import audio_message_pb2 as audio__message__pb2\nDESCRIPTOR = "%s"\n' "$name" > "$out/${name}_pb2.py"
        printf 'import grpc\n' > "$out/${name}_pb2_grpc.py"
        printf 'DESCRIPTOR = "audio_message"\n' > "$out/audio_message_pb2.py"
      fi
      ;;
  esac
done
"#;

/// In-process stand-in for the code compiler
///
/// Same output as [`FAKE_PROTOC_SCRIPT`]. Compiling a failing definition,
/// or compiling into a failing package's module directory, returns a
/// compile error. Per-module quirks produce output the rewriter rejects.
#[derive(Debug, Default)]
pub struct FakeCompiler {
    failing: HashSet<String>,
    failing_modules: HashSet<String>,
    dropping_own: HashSet<String>,
    unqualified: HashSet<String>,
    base_symbol: String,
}

impl FakeCompiler {
    /// Fake whose service definitions import `audio_message`
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            failing_modules: HashSet::new(),
            dropping_own: HashSet::new(),
            unqualified: HashSet::new(),
            base_symbol: "audio_message".to_string(),
        }
    }

    /// Fail whenever this definition file is compiled
    pub fn failing_on(mut self, proto_file: &str) -> Self {
        self.failing.insert(proto_file.to_string());
        self
    }

    /// Fail whenever the package with this module name is compiled
    pub fn failing_for_module(mut self, module: &str) -> Self {
        self.failing_modules.insert(module.to_string());
        self
    }

    /// Skip the package's own `_pb2.py` when compiling into this module
    pub fn dropping_own_module_for(mut self, module: &str) -> Self {
        self.dropping_own.insert(module.to_string());
        self
    }

    /// Emit a `from <base>_pb2 import ...` line the rewriter does not
    /// qualify when compiling into this module
    pub fn unqualified_import_for(mut self, module: &str) -> Self {
        self.unqualified.insert(module.to_string());
        self
    }

    fn write(path: &Path, content: &str) -> Result<(), CompileError> {
        std::fs::write(path, content).map_err(|e| CompileError::Spawn {
            program: "fake".to_string(),
            error: e.to_string(),
        })
    }
}

impl CodeCompiler for FakeCompiler {
    fn compile(&self, request: &CompileRequest<'_>) -> Result<CompileOutput, CompileError> {
        std::fs::create_dir_all(request.out_dir).map_err(|e| CompileError::Spawn {
            program: "fake".to_string(),
            error: e.to_string(),
        })?;

        let module = request
            .out_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if self.failing_modules.contains(&module) {
            return Err(CompileError::Failed {
                status: "exit status: 1".to_string(),
                diagnostics: format!("{module}: simulated failure"),
            });
        }

        let mut artifacts = Vec::new();
        for file in request.proto_files {
            if self.failing.contains(file) {
                return Err(CompileError::Failed {
                    status: "exit status: 1".to_string(),
                    diagnostics: format!("{file}:1:1: Expected top-level statement"),
                });
            }

            let name = protopack::core::package::logical_name(file);
            let pb2 = format!("{name}_pb2.py");
            if name == self.base_symbol {
                Self::write(
                    &request.out_dir.join(&pb2),
                    &format!("DESCRIPTOR = \"{name}\"\n"),
                )?;
            } else {
                let base = &self.base_symbol;
                let alias = format!("{base}_pb2").replace('_', "__");
                let mut content = format!("import {base}_pb2 as {alias}\nDESCRIPTOR = \"{name}\"\n");
                if self.unqualified.contains(&module) {
                    content.push_str(&format!("from {base}_pb2 import AudioMessage\n"));
                }
                if !self.dropping_own.contains(&module) {
                    Self::write(&request.out_dir.join(&pb2), &content)?;
                }
                let grpc = format!("{name}_pb2_grpc.py");
                Self::write(&request.out_dir.join(&grpc), "import grpc\n")?;
                let copy = format!("{base}_pb2.py");
                Self::write(
                    &request.out_dir.join(&copy),
                    &format!("DESCRIPTOR = \"{base}\"\n"),
                )?;
                artifacts.push(PathBuf::from(grpc));
                artifacts.push(PathBuf::from(copy));
                if self.dropping_own.contains(&module) {
                    continue;
                }
            }
            artifacts.push(PathBuf::from(pb2));
        }

        artifacts.sort();
        artifacts.dedup();
        Ok(CompileOutput {
            artifacts,
            diagnostics: String::new(),
        })
    }

    fn describe(&self) -> String {
        "fake".to_string()
    }
}

/// Every file under `root`, relative path to contents, sorted
pub fn snapshot(root: &Path) -> Vec<(String, Vec<u8>)> {
    let mut files: Vec<(String, Vec<u8>)> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e
                .path()
                .strip_prefix(root)
                .expect("walked path is under root")
                .to_string_lossy()
                .to_string();
            let bytes = std::fs::read(e.path()).expect("Failed to read file");
            (relative, bytes)
        })
        .collect();
    files.sort();
    files
}
