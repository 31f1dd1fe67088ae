//! Integration tests for the build pipeline
//!
//! Drives the orchestrator with an in-process fake compiler:
//! - The messages package and a dependent client package come out complete
//! - Dependents import base modules through the base package
//! - Base-owned copies never survive in a dependent package
//! - Manifests depend on the declared base by absolute file URI
//! - Two runs produce byte-identical trees
//! - One failing package leaves the others built, whatever the failing stage
//! - Invalid package fields stop the build before any output

mod common;

use std::path::Path;

use common::{snapshot, FakeCompiler, TestProject};
use protopack::config::defaults::default_packages;
use protopack::core::assembler::PackageAssembler;
use protopack::core::builder::BuildOrchestrator;
use protopack::core::package::{PackageRole, PackageSpec, ServiceFamily};
use protopack::core::render::{Template, TemplateEngine, TemplateId, TemplateRenderer};
use protopack::core::report::{ArtifactKind, BuildReport, Stage};
use protopack::error::{ProtopackError, RenderError};

fn build(project: &TestProject, compiler: &FakeCompiler, specs: &[PackageSpec]) -> BuildReport {
    let engine = TemplateEngine::builtin();
    BuildOrchestrator::new(
        compiler,
        &engine,
        &project.path().join("proto"),
        &project.path().join("out"),
    )
    .run(specs)
    .expect("build should start")
}

fn packages_dir(project: &TestProject) -> std::path::PathBuf {
    project.path().join("out").join("packages")
}

// ============================================
// Scenarios
// ============================================

#[test]
fn test_messages_package_layout() {
    let project = TestProject::with_default_protos();
    let report = build(&project, &FakeCompiler::new(), &default_packages());
    assert!(report.is_success(), "{report:?}");

    let pkg = packages_dir(&project).join("audiomessages");
    assert!(pkg.join("audiomessages/audio_message_pb2.py").is_file());
    assert!(pkg.join("tests").is_dir());
    assert!(pkg.join("README.md").is_file());

    let init = std::fs::read_to_string(pkg.join("audiomessages/__init__.py")).unwrap();
    assert!(init.contains("from .audio_message_pb2 import *"));

    let manifest = std::fs::read_to_string(pkg.join("pyproject.toml")).unwrap();
    let parsed: toml::Value = toml::from_str(&manifest).expect("manifest is valid TOML");
    let deps = parsed["project"]["dependencies"].as_array().unwrap();
    assert_eq!(deps.len(), 1);
    assert!(deps[0].as_str().unwrap().starts_with("protobuf"));
    assert_eq!(parsed["project"]["name"].as_str(), Some("audiomessages"));

    let result = report.result("AudioMessages").unwrap();
    assert_eq!(
        result.artifacts.get("audiomessages/__init__.py"),
        Some(ArtifactKind::Rendered)
    );
}

#[test]
fn test_client_package_imports_through_base() {
    let project = TestProject::with_default_protos();
    let report = build(&project, &FakeCompiler::new(), &default_packages());
    assert!(report.is_success(), "{report:?}");

    let pkg = packages_dir(&project).join("transcribeclient");
    let module = pkg.join("transcribeclient");

    let pb2 = std::fs::read_to_string(module.join("transcribe_interface_pb2.py")).unwrap();
    assert!(pb2.contains("import audiomessages.audio_message_pb2 as audio__message__pb2"));
    assert!(!pb2.lines().any(|l| l.starts_with("import audio_message_pb2")));
    assert!(!module.join("audio_message_pb2.py").exists());
    assert!(module.join("client.py").is_file());

    let client = std::fs::read_to_string(module.join("client.py")).unwrap();
    assert!(client.contains("TranscribeWorker"));
    assert!(!client.contains("{{"));

    let manifest = std::fs::read_to_string(pkg.join("pyproject.toml")).unwrap();
    let parsed: toml::Value = toml::from_str(&manifest).unwrap();
    let deps: Vec<&str> = parsed["project"]["dependencies"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(toml::Value::as_str)
        .collect();
    let base_uri = format!(
        "audiomessages @ {}",
        protopack::infra::filesystem::file_uri(&packages_dir(&project).join("audiomessages"))
            .unwrap()
    );
    assert!(deps.contains(&base_uri.as_str()), "{deps:?}");
    assert!(deps.iter().any(|d| d.starts_with("grpcio-tools")));

    let result = report.result("TranscribeClient").unwrap();
    assert_eq!(
        result
            .artifacts
            .get("transcribeclient/transcribe_interface_pb2.py"),
        Some(ArtifactKind::Rewritten)
    );
    assert!(!result.artifacts.contains("transcribeclient/audio_message_pb2.py"));
}

#[test]
fn test_server_package_has_launcher_and_example() {
    let project = TestProject::with_default_protos();
    let report = build(&project, &FakeCompiler::new(), &default_packages());
    assert!(report.is_success());

    let module = packages_dir(&project).join("audiocloneserver/audiocloneserver");
    for file in ["server.py", "grpc_server_launcher.py", "server_example.py"] {
        assert!(module.join(file).is_file(), "missing {file}");
    }
    let server = std::fs::read_to_string(module.join("server.py")).unwrap();
    assert!(server.contains("NotImplementedError"));
}

// ============================================
// Properties
// ============================================

#[test]
fn test_no_dependent_keeps_base_owned_modules() {
    let project = TestProject::with_default_protos();
    let report = build(&project, &FakeCompiler::new(), &default_packages());
    assert!(report.is_success());

    for spec in default_packages()
        .iter()
        .filter(|s| s.role != PackageRole::Messages)
    {
        let dir = packages_dir(&project).join(spec.module_name());
        for (path, _) in snapshot(&dir) {
            assert!(
                !Path::new(&path).ends_with("audio_message_pb2.py"),
                "{} still holds {path}",
                spec.name
            );
        }
    }
}

#[cfg(unix)]
#[test]
fn test_output_root_with_space_gives_encoded_uri() {
    let project = TestProject::with_default_protos();
    let engine = TemplateEngine::builtin();
    let compiler = FakeCompiler::new();
    let report = BuildOrchestrator::new(
        &compiler,
        &engine,
        &project.path().join("proto"),
        &project.path().join("gen out"),
    )
    .run(&default_packages())
    .unwrap();
    assert!(report.is_success(), "{report:?}");

    let manifest = std::fs::read_to_string(
        project
            .path()
            .join("gen out/packages/transcribeclient/pyproject.toml"),
    )
    .unwrap();
    assert!(manifest.contains("/gen%20out/packages/audiomessages\""), "{manifest}");
    assert!(!manifest.contains("gen out"));
}

#[test]
fn test_rebuild_is_byte_identical() {
    let project = TestProject::with_default_protos();
    let compiler = FakeCompiler::new();

    let first = build(&project, &compiler, &default_packages());
    let tree_first = snapshot(&project.path().join("out"));
    let second = build(&project, &compiler, &default_packages());
    let tree_second = snapshot(&project.path().join("out"));

    assert_eq!(tree_first, tree_second);
    for (a, b) in first.results.iter().zip(&second.results) {
        assert_eq!(a.artifacts, b.artifacts);
        assert_eq!(
            a.artifacts.fingerprint(&a.package_dir).unwrap(),
            b.artifacts.fingerprint(&b.package_dir).unwrap()
        );
    }
}

#[test]
fn test_qualification_uses_declared_base_name() {
    let project = TestProject::new();
    project.create_file("proto/audio-message.proto", "syntax = \"proto3\";\n");
    project.create_file("proto/transcribe-interface.proto", "syntax = \"proto3\";\n");

    // Dependent declared first; build order puts the base first
    let specs = vec![
        PackageSpec::new(
            "SpeechClient",
            PackageRole::Client,
            &["transcribe-interface.proto"],
        )
        .with_service("TranscribeWorker", ServiceFamily::Transcription)
        .depends_on("SharedTypes"),
        PackageSpec::new("SharedTypes", PackageRole::Messages, &["audio-message.proto"]),
    ];

    let report = build(&project, &FakeCompiler::new(), &specs);
    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.results[0].package, "SharedTypes");

    let pb2 = std::fs::read_to_string(
        packages_dir(&project).join("speechclient/speechclient/transcribe_interface_pb2.py"),
    )
    .unwrap();
    assert!(pb2.contains("import sharedtypes.audio_message_pb2 as audio__message__pb2"));
}

#[test]
fn test_one_failure_leaves_others_built() {
    let project = TestProject::with_default_protos();
    let compiler = FakeCompiler::new().failing_for_module("audiocloneclient");

    let report = build(&project, &compiler, &default_packages());
    assert_eq!(report.attempted(), 5);
    assert_eq!(report.succeeded(), 4);
    assert!(!report.is_success());
    assert_eq!(report.exit_code(), 1);

    let failed = report.failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].package, "AudioCloneClient");
    assert_eq!(failed[0].failed_stage, Some(Stage::Compile));
    assert!(failed[0]
        .error
        .as_deref()
        .is_some_and(|e| e.contains("simulated failure")));

    assert!(packages_dir(&project)
        .join("audiocloneserver/pyproject.toml")
        .is_file());
}

#[test]
fn test_missing_definition_reported_at_compile() {
    let project = TestProject::new();
    project.create_file("proto/audio-message.proto", "syntax = \"proto3\";\n");
    project.create_file("proto/transcribe-interface.proto", "syntax = \"proto3\";\n");

    let mut specs = default_packages();
    specs[3].proto_files = vec!["missing.proto".to_string()];

    let engine = TemplateEngine::builtin();
    let compiler = protopack::infra::compiler::ProtocCompiler::new(vec![
        "protopack-no-such-compiler".to_string(),
    ]);
    let report = BuildOrchestrator::new(
        &compiler,
        &engine,
        &project.path().join("proto"),
        &project.path().join("out"),
    )
    .run(&specs)
    .unwrap();

    // Every package fails at compile: no compiler, and one missing file
    assert_eq!(report.succeeded(), 0);
    let clone = report.result("AudioCloneClient").unwrap();
    assert_eq!(clone.failed_stage, Some(Stage::Compile));
    assert!(clone.error.as_deref().unwrap().contains("missing.proto"));
}

// ============================================
// Configuration errors stop the build up front
// ============================================

#[test]
fn test_cycle_is_rejected_before_building() {
    let project = TestProject::with_default_protos();
    let specs = vec![
        PackageSpec::new("A", PackageRole::Messages, &["audio-message.proto"]).depends_on("B"),
        PackageSpec::new("B", PackageRole::Messages, &["clone-interface.proto"]).depends_on("A"),
    ];

    let engine = TemplateEngine::builtin();
    let compiler = FakeCompiler::new();
    let result = BuildOrchestrator::new(
        &compiler,
        &engine,
        &project.path().join("proto"),
        &project.path().join("out"),
    )
    .run(&specs);

    assert!(matches!(result, Err(ProtopackError::Resolver(_))));
    assert!(!project.file_exists("out"));
}

#[test]
fn test_incomplete_template_override_is_rejected() {
    let project = TestProject::with_default_protos();
    project.create_file("templates/package_readme.md.tmpl", "# {{ package_name }}\n");

    let engine = TemplateEngine::with_override_dir(project.path().join("templates"));
    let compiler = FakeCompiler::new();
    let result = BuildOrchestrator::new(
        &compiler,
        &engine,
        &project.path().join("proto"),
        &project.path().join("out"),
    )
    .run(&default_packages());

    assert!(matches!(result, Err(ProtopackError::Render(_))));
    assert!(!project.file_exists("out"));
}

#[test]
fn test_complete_template_override_is_used() {
    let project = TestProject::with_default_protos();
    let templates = project.path().join("templates");
    protopack::core::render::export_builtin(&templates, false).unwrap();
    project.create_file(
        "templates/package_readme.md.tmpl",
        "# {{ package_name }} (custom)\n\n{{ description }}\n\n{{ usage_examples }}\n",
    );

    let engine = TemplateEngine::with_override_dir(templates);
    let compiler = FakeCompiler::new();
    let report = BuildOrchestrator::new(
        &compiler,
        &engine,
        &project.path().join("proto"),
        &project.path().join("out"),
    )
    .run(&default_packages())
    .unwrap();
    assert!(report.is_success());

    let readme = std::fs::read_to_string(
        packages_dir(&project).join("audiomessages/README.md"),
    )
    .unwrap();
    assert!(readme.starts_with("# AudioMessages (custom)"));
}

#[test]
fn test_client_without_family_is_rejected_before_building() {
    let project = TestProject::with_default_protos();
    let mut specs = default_packages();
    specs[1].family = None;

    let engine = TemplateEngine::builtin();
    let compiler = FakeCompiler::new();
    let result = BuildOrchestrator::new(
        &compiler,
        &engine,
        &project.path().join("proto"),
        &project.path().join("out"),
    )
    .run(&specs);

    match result {
        Err(ProtopackError::Config(e)) => assert!(e.to_string().contains("family"), "{e}"),
        other => panic!("expected a configuration error, got {other:?}"),
    }
    assert!(!project.file_exists("out"));
}

// ============================================
// Stage failures stay with their package
// ============================================

#[test]
fn test_client_without_family_fails_at_render() {
    let project = TestProject::with_default_protos();
    let specs = default_packages();
    let base = &specs[0];
    let mut client = specs[1].clone();
    client.family = None;

    let engine = TemplateEngine::builtin();
    let compiler = FakeCompiler::new();
    let assembler = PackageAssembler::new(
        &compiler,
        &engine,
        &project.path().join("proto"),
        &project.path().join("out"),
    );
    let result = assembler.assemble(&client, &[base]);

    assert!(!result.success);
    assert_eq!(result.failed_stage, Some(Stage::Render));
    assert!(result
        .error
        .as_deref()
        .is_some_and(|e| e.contains("no service family")));
    assert!(!result.package_dir.join("transcribeclient/client.py").exists());
    assert!(!result.package_dir.join("pyproject.toml").exists());
}

#[test]
fn test_unqualified_reference_fails_at_rewrite() {
    let project = TestProject::with_default_protos();
    let compiler = FakeCompiler::new().unqualified_import_for("audiocloneclient");

    let report = build(&project, &compiler, &default_packages());

    assert_eq!(report.succeeded(), 4);
    let failed = report.failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].package, "AudioCloneClient");
    assert_eq!(failed[0].failed_stage, Some(Stage::Rewrite));
    assert!(failed[0]
        .error
        .as_deref()
        .is_some_and(|e| e.contains("audio_message")));
    assert!(!packages_dir(&project)
        .join("audiocloneclient/pyproject.toml")
        .exists());
    assert!(packages_dir(&project)
        .join("audiocloneserver/pyproject.toml")
        .is_file());
}

#[test]
fn test_missing_own_module_fails_at_rewrite() {
    let project = TestProject::with_default_protos();
    let compiler = FakeCompiler::new().dropping_own_module_for("transcribeserver");

    let report = build(&project, &compiler, &default_packages());

    assert_eq!(report.succeeded(), 4);
    let server = report.result("TranscribeServer").unwrap();
    assert!(!server.success);
    assert_eq!(server.failed_stage, Some(Stage::Rewrite));
    assert!(server
        .error
        .as_deref()
        .is_some_and(|e| e.contains("transcribe_interface_pb2.py")));
    assert!(report.result("TranscribeClient").unwrap().success);
}

/// Built-in engine that refuses to render the client wrapper
struct NoClientWrapper(TemplateEngine);

impl TemplateRenderer for NoClientWrapper {
    fn render(&self, template: &Template) -> Result<String, RenderError> {
        if template.id() == TemplateId::ClientWrapper {
            return Err(RenderError::ReadError {
                template: TemplateId::ClientWrapper.file_name().to_string(),
                error: "unreadable".to_string(),
            });
        }
        self.0.render(template)
    }

    fn verify(&self, ids: &[TemplateId]) -> Result<(), RenderError> {
        self.0.verify(ids)
    }
}

#[test]
fn test_render_failure_skips_manifest_and_docs() {
    let project = TestProject::with_default_protos();
    let renderer = NoClientWrapper(TemplateEngine::builtin());
    let compiler = FakeCompiler::new();

    let report = BuildOrchestrator::new(
        &compiler,
        &renderer,
        &project.path().join("proto"),
        &project.path().join("out"),
    )
    .run(&default_packages())
    .unwrap();

    // Both client packages use the wrapper
    assert_eq!(report.succeeded(), 3);
    for (name, module) in [
        ("TranscribeClient", "transcribeclient"),
        ("AudioCloneClient", "audiocloneclient"),
    ] {
        let result = report.result(name).unwrap();
        assert_eq!(result.failed_stage, Some(Stage::Render), "{name}");
        let pkg = packages_dir(&project).join(module);
        assert!(!pkg.join("pyproject.toml").exists(), "{name}");
        assert!(!pkg.join("README.md").exists(), "{name}");
    }
    assert!(report.result("TranscribeServer").unwrap().success);
}
