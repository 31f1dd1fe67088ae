//! Package assembly
//!
//! Runs the six stages for one package: skeleton, compile, rewrite, render,
//! manifest, docs. The first failing stage ends the attempt; its output stays
//! on disk and is overwritten by the next run.

use std::path::{Path, PathBuf};

use crate::config::defaults::{PACKAGES_SUBDIR, TESTS_SUBDIR};
use crate::core::manifest::manifest_params;
use crate::core::package::{PackageRole, PackageSpec, ServiceFamily};
use crate::core::render::{
    indent, ClientWrapperParams, MessagesInitParams, MethodsParams, ReadmeParams,
    ServerExampleParams, ServerSkeletonParams, Template, TemplateRenderer, UsageParams,
};
use crate::core::report::{ArtifactKind, BuildResult, GeneratedArtifactSet, Stage};
use crate::core::rewrite::ReferenceRewriter;
use crate::error::{FilesystemError, RenderError, RewriteError};
use crate::infra::compiler::{CodeCompiler, CompileRequest};
use crate::infra::filesystem;

/// Module marker written after compilation
const INIT_FILE: &str = "__init__.py";

/// Assembles packages into an output root
pub struct PackageAssembler<'a> {
    compiler: &'a dyn CodeCompiler,
    renderer: &'a dyn TemplateRenderer,
    proto_dir: PathBuf,
    packages_dir: PathBuf,
}

/// Error from a stage, tagged with the stage it came from
struct StageError {
    stage: Stage,
    message: String,
}

impl StageError {
    fn new(stage: Stage, error: impl std::fmt::Display) -> Self {
        Self {
            stage,
            message: error.to_string(),
        }
    }
}

impl<'a> PackageAssembler<'a> {
    /// Create an assembler writing below `output_dir/packages`
    pub fn new(
        compiler: &'a dyn CodeCompiler,
        renderer: &'a dyn TemplateRenderer,
        proto_dir: &Path,
        output_dir: &Path,
    ) -> Self {
        Self {
            compiler,
            renderer,
            proto_dir: proto_dir.to_path_buf(),
            packages_dir: output_dir.join(PACKAGES_SUBDIR),
        }
    }

    /// Directory holding every package
    pub fn packages_dir(&self) -> &Path {
        &self.packages_dir
    }

    /// Directory of one package
    pub fn package_dir(&self, spec: &PackageSpec) -> PathBuf {
        self.packages_dir.join(spec.module_name())
    }

    /// Assemble one package
    ///
    /// `dependencies` are the resolved specs the package declares.
    pub fn assemble(&self, spec: &PackageSpec, dependencies: &[&PackageSpec]) -> BuildResult {
        let package_dir = self.package_dir(spec);
        let mut artifacts = GeneratedArtifactSet::new();

        tracing::info!("Assembling {} in {}", spec.name, package_dir.display());

        match self.run_stages(spec, dependencies, &package_dir, &mut artifacts) {
            Ok(()) => {
                tracing::info!("Assembled {} ({} artifacts)", spec.name, artifacts.len());
                BuildResult::succeeded(&spec.name, package_dir, artifacts)
            }
            Err(e) => {
                tracing::warn!("{} failed at stage {}: {}", spec.name, e.stage, e.message);
                BuildResult::failed(&spec.name, package_dir, artifacts, e.stage, e.message)
            }
        }
    }

    fn run_stages(
        &self,
        spec: &PackageSpec,
        dependencies: &[&PackageSpec],
        package_dir: &Path,
        artifacts: &mut GeneratedArtifactSet,
    ) -> Result<(), StageError> {
        let module = spec.module_name();
        let module_dir = package_dir.join(&module);

        self.skeleton(package_dir, &module_dir)
            .map_err(|e| StageError::new(Stage::Skeleton, e))?;

        self.compile(spec, &module_dir, artifacts)
            .map_err(|e| StageError::new(Stage::Compile, e))?;

        if spec.role != PackageRole::Messages {
            self.rewrite(spec, dependencies, &module_dir, artifacts)
                .map_err(|e| StageError::new(Stage::Rewrite, e))?;
        }

        self.render_sources(spec, package_dir, artifacts)
            .map_err(|e| StageError::new(Stage::Render, e))?;

        let params = manifest_params(spec, dependencies, &self.packages_dir)
            .map_err(|e| StageError::new(Stage::Manifest, e))?;
        let manifest = self
            .renderer
            .render(&Template::Manifest(params))
            .map_err(|e| StageError::new(Stage::Manifest, e))?;
        emit(package_dir, Path::new("pyproject.toml"), &manifest, artifacts)
            .map_err(|e| StageError::new(Stage::Manifest, e))?;

        self.docs(spec, package_dir, artifacts)
            .map_err(|e| StageError::new(Stage::Docs, e))?;

        Ok(())
    }

    fn skeleton(&self, package_dir: &Path, module_dir: &Path) -> Result<(), FilesystemError> {
        filesystem::create_dir_all(package_dir)?;
        filesystem::create_dir_all(module_dir)?;
        filesystem::create_dir_all(&package_dir.join(TESTS_SUBDIR))
    }

    fn compile(
        &self,
        spec: &PackageSpec,
        module_dir: &Path,
        artifacts: &mut GeneratedArtifactSet,
    ) -> Result<(), crate::error::CompileError> {
        let request = CompileRequest {
            proto_dir: &self.proto_dir,
            proto_files: &spec.proto_files,
            out_dir: module_dir,
        };
        tracing::debug!("Compiling {} with {}", spec.name, self.compiler.describe());
        let output = self.compiler.compile(&request)?;

        let module = PathBuf::from(spec.module_name());
        for artifact in &output.artifacts {
            tracing::debug!("Generated {}", artifact.display());
            artifacts.insert(&module.join(artifact), ArtifactKind::Compiled);
        }

        filesystem::write_file(&module_dir.join(INIT_FILE), "")?;
        artifacts.insert(&module.join(INIT_FILE), ArtifactKind::Compiled);
        Ok(())
    }

    fn rewrite(
        &self,
        spec: &PackageSpec,
        dependencies: &[&PackageSpec],
        module_dir: &Path,
        artifacts: &mut GeneratedArtifactSet,
    ) -> Result<(), RewriteError> {
        let module = PathBuf::from(spec.module_name());

        for dependency in dependencies {
            let rewriter = ReferenceRewriter::for_dependency(dependency)?;
            let summary = rewriter.apply(module_dir)?;

            for path in &summary.removed {
                if let Ok(relative) = path.strip_prefix(module_dir) {
                    artifacts.remove(&module.join(relative));
                }
            }
            for path in &summary.rewritten {
                if let Ok(relative) = path.strip_prefix(module_dir) {
                    artifacts.insert(&module.join(relative), ArtifactKind::Rewritten);
                }
            }
        }

        let base_owned: Vec<String> = dependencies
            .iter()
            .flat_map(|dep| dep.proto_modules())
            .collect();
        for own in spec.proto_modules() {
            if base_owned.contains(&own) {
                continue;
            }
            let path = module_dir.join(format!("{own}_pb2.py"));
            if !path.is_file() {
                return Err(RewriteError::MissingArtifact { path });
            }
        }
        Ok(())
    }

    fn render_sources(
        &self,
        spec: &PackageSpec,
        package_dir: &Path,
        artifacts: &mut GeneratedArtifactSet,
    ) -> Result<(), RenderError> {
        let module = spec.module_name();
        let rel = |file: &str| PathBuf::from(&module).join(file);

        match (spec.role, spec.family) {
            (PackageRole::Messages, _) => {
                let text = self.renderer.render(&Template::MessagesInit(MessagesInitParams {
                    description: spec.description.clone(),
                    message_imports: message_imports(spec),
                }))?;
                emit(package_dir, &rel(INIT_FILE), &text, artifacts)?;
            }
            (PackageRole::Client, Some(family)) => {
                let text = self.renderer.render(&Template::ClientWrapper(ClientWrapperParams {
                    description: spec.description.clone(),
                    module_name: module.clone(),
                    package_name: spec.name.clone(),
                    service_name: spec.service_name().to_string(),
                    service_methods: self.method_set(spec, family, true)?,
                    proto_module: spec.primary_proto_module().unwrap_or_default(),
                }))?;
                emit(package_dir, &rel("client.py"), &text, artifacts)?;
            }
            (PackageRole::Server, Some(family)) => {
                let skeleton = self.renderer.render(&Template::ServerSkeleton(ServerSkeletonParams {
                    description: spec.description.clone(),
                    module_name: module.clone(),
                    service_name: spec.service_name().to_string(),
                    service_methods: self.method_set(spec, family, false)?,
                    proto_module: spec.primary_proto_module().unwrap_or_default(),
                }))?;
                emit(package_dir, &rel("server.py"), &skeleton, artifacts)?;

                let launcher = self.renderer.render(&Template::ServerLauncher)?;
                emit(package_dir, &rel("grpc_server_launcher.py"), &launcher, artifacts)?;

                let example = self.renderer.render(&Template::ServerExample(ServerExampleParams {
                    description: spec.description.clone(),
                    module_name: module.clone(),
                    package_name: spec.name.clone(),
                    service_name: spec.service_name().to_string(),
                    proto_module: spec.primary_proto_module().unwrap_or_default(),
                }))?;
                emit(package_dir, &rel("server_example.py"), &example, artifacts)?;
            }
            (role, None) => {
                return Err(RenderError::MissingFamily {
                    package: spec.name.clone(),
                    role: role.to_string(),
                });
            }
        }
        Ok(())
    }

    fn method_set(
        &self,
        spec: &PackageSpec,
        family: ServiceFamily,
        client: bool,
    ) -> Result<String, RenderError> {
        let params = MethodsParams {
            service_name: spec.service_name().to_string(),
        };
        let template = if client {
            Template::ClientMethods(family, params)
        } else {
            Template::ServerMethods(family, params)
        };
        let text = self.renderer.render(&template)?;
        Ok(indent(text.trim_end(), 4))
    }

    fn docs(
        &self,
        spec: &PackageSpec,
        package_dir: &Path,
        artifacts: &mut GeneratedArtifactSet,
    ) -> Result<(), RenderError> {
        let usage = self.renderer.render(&Template::Usage(
            spec.role,
            UsageParams {
                package_name: spec.name.clone(),
                module_name: spec.module_name(),
                service_name: spec.service_name().to_string(),
                message_module: spec.primary_proto_module().unwrap_or_default(),
            },
        ))?;

        let readme = self.renderer.render(&Template::Readme(ReadmeParams {
            package_name: spec.name.clone(),
            description: spec.description.clone(),
            usage_examples: usage.trim_end().to_string(),
        }))?;
        emit(package_dir, Path::new("README.md"), &readme, artifacts)?;
        Ok(())
    }
}

/// `from .<module>_pb2 import *` for every generated message module
fn message_imports(spec: &PackageSpec) -> String {
    spec.proto_modules()
        .iter()
        .map(|m| format!("from .{m}_pb2 import *  # noqa: F401,F403"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn emit(
    package_dir: &Path,
    relative: &Path,
    content: &str,
    artifacts: &mut GeneratedArtifactSet,
) -> Result<(), FilesystemError> {
    filesystem::write_file(&package_dir.join(relative), content)?;
    tracing::debug!("Wrote {}", relative.display());
    artifacts.insert(relative, ArtifactKind::Rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::default_packages;

    #[test]
    fn test_message_imports() {
        let spec = PackageSpec::new(
            "Shared",
            PackageRole::Messages,
            &["audio-message.proto", "metadata.proto"],
        );
        assert_eq!(
            message_imports(&spec),
            "from .audio_message_pb2 import *  # noqa: F401,F403\nfrom .metadata_pb2 import *  # noqa: F401,F403"
        );
    }

    #[test]
    fn test_package_dir_uses_module_name() {
        struct NoCompiler;
        impl CodeCompiler for NoCompiler {
            fn compile(
                &self,
                _request: &CompileRequest<'_>,
            ) -> Result<crate::infra::compiler::CompileOutput, crate::error::CompileError> {
                Err(crate::error::CompileError::EmptyCommand)
            }
            fn describe(&self) -> String {
                "none".to_string()
            }
        }

        let engine = crate::core::render::TemplateEngine::builtin();
        let assembler =
            PackageAssembler::new(&NoCompiler, &engine, Path::new("/proto"), Path::new("/out"));
        let packages = default_packages();
        assert_eq!(
            assembler.package_dir(&packages[1]),
            PathBuf::from("/out/packages/transcribeclient")
        );
    }
}
