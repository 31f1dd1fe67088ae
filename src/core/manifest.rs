//! Package manifest (pyproject.toml) contents
//!
//! The dependency set is a pure function of the package role and its
//! declared dependencies. Local dependencies are referenced by absolute
//! `file://` URI so the manifest installs from any working directory.

use std::path::Path;

use crate::config::defaults::{
    GRPCIO_REQUIREMENT, GRPCIO_TOOLS_REQUIREMENT, PROTOBUF_REQUIREMENT, REQUIRES_PYTHON,
};
use crate::core::package::{PackageRole, PackageSpec};
use crate::core::render::ManifestParams;
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Requirement strings for a package
///
/// Messages packages need only the serialization runtime. Every other role
/// needs the RPC runtime and tooling plus one local reference per dependency.
pub fn dependency_set(
    spec: &PackageSpec,
    dependencies: &[&PackageSpec],
    packages_dir: &Path,
) -> Result<Vec<String>, FilesystemError> {
    if spec.role == PackageRole::Messages {
        return Ok(vec![PROTOBUF_REQUIREMENT.to_string()]);
    }

    let mut requirements = vec![
        GRPCIO_REQUIREMENT.to_string(),
        GRPCIO_TOOLS_REQUIREMENT.to_string(),
        PROTOBUF_REQUIREMENT.to_string(),
    ];
    for dep in dependencies {
        requirements.push(local_requirement(dep, packages_dir)?);
    }
    Ok(requirements)
}

/// `<module> @ file://<packages_dir>/<module>`
pub fn local_requirement(
    dependency: &PackageSpec,
    packages_dir: &Path,
) -> Result<String, FilesystemError> {
    let module = dependency.module_name();
    let uri = filesystem::file_uri(&packages_dir.join(&module))?;
    Ok(format!("{module} @ {uri}"))
}

/// Template parameters for a package's `pyproject.toml`
pub fn manifest_params(
    spec: &PackageSpec,
    dependencies: &[&PackageSpec],
    packages_dir: &Path,
) -> Result<ManifestParams, FilesystemError> {
    Ok(ManifestParams {
        module_name: spec.module_name(),
        version: spec.version.clone(),
        description: spec.description.clone(),
        requires_python: REQUIRES_PYTHON.to_string(),
        dependencies: dependency_set(spec, dependencies, packages_dir)?,
    })
}
