//! Project initialization logic
//!
//! Writes a `protopack.toml` describing the built-in package table, creates
//! the proto directory and keeps generated output out of version control.

use std::path::{Path, PathBuf};

use crate::config::defaults::{
    CONFIG_FILE_NAME, DEFAULT_COMPILER, DEFAULT_OUTPUT_DIR, DEFAULT_PROTO_DIR,
};
use crate::core::config::{BuildSection, ProjectConfig};
use crate::error::InitError;
use crate::infra::filesystem;

/// Entries to add to .gitignore
pub const GITIGNORE_ENTRIES: &[&str] = &["generated_packages/"];

/// Marker comment for the protopack section in .gitignore
pub const GITIGNORE_MARKER: &str = "# protopack";

/// Result of initialization
#[derive(Debug)]
pub struct InitResult {
    /// Path to the written config file
    pub config_path: PathBuf,
    /// Whether the proto directory was created
    pub proto_dir_created: bool,
    /// Whether an existing .gitignore was updated (rather than created)
    pub gitignore_existed: bool,
}

/// Generate the default config content with comments
pub fn generate_config_content() -> Result<String, InitError> {
    let config = ProjectConfig {
        build: BuildSection {
            proto_dir: Some(PathBuf::from(DEFAULT_PROTO_DIR)),
            output_dir: Some(PathBuf::from(DEFAULT_OUTPUT_DIR)),
            templates_dir: None,
            compiler: Some(DEFAULT_COMPILER.iter().map(|s| (*s).to_string()).collect()),
        },
        ..ProjectConfig::default()
    };

    let body = config.to_toml().map_err(|e| InitError::Serialize {
        error: e.to_string(),
    })?;

    Ok(format!(
        "# protopack configuration
#
# Paths are relative to this file. String values may use ${{VAR}} to read
# environment variables. OUTPUT_DIR, PROTO_DIR and PROTOPACK_TEMPLATES_DIR
# override the [build] settings.
#
# templates_dir = \"templates\"   # see `protopack templates export`

{body}"
    ))
}

/// Generate .gitignore content for protopack
pub fn generate_gitignore_content() -> String {
    let mut content = String::from(GITIGNORE_MARKER);
    content.push('\n');
    for entry in GITIGNORE_ENTRIES {
        content.push_str(entry);
        content.push('\n');
    }
    content
}

/// Append protopack entries to existing .gitignore content
pub fn append_gitignore_entries(existing: &str) -> String {
    if existing.contains(GITIGNORE_MARKER) {
        return existing.to_string();
    }

    let mut result = existing.to_string();
    if !result.is_empty() && !result.ends_with('\n') {
        result.push('\n');
    }
    if !result.is_empty() {
        result.push('\n');
    }
    result.push_str(&generate_gitignore_content());
    result
}

/// Initialize a project in `path`
pub fn init_project(path: &Path, force: bool) -> Result<InitResult, InitError> {
    if !path.is_dir() {
        return Err(InitError::DirectoryNotFound {
            path: path.to_path_buf(),
        });
    }

    let config_path = path.join(CONFIG_FILE_NAME);
    if config_path.exists() && !force {
        return Err(InitError::ConfigExists { path: config_path });
    }
    filesystem::write_file(&config_path, &generate_config_content()?)?;

    let proto_dir = path.join(DEFAULT_PROTO_DIR);
    let proto_dir_created = !proto_dir.exists();
    filesystem::create_dir_all(&proto_dir)?;

    let gitignore_path = path.join(".gitignore");
    let gitignore_existed = gitignore_path.exists();
    let gitignore = if gitignore_existed {
        append_gitignore_entries(&filesystem::read_file(&gitignore_path)?)
    } else {
        generate_gitignore_content()
    };
    filesystem::write_file(&gitignore_path, &gitignore)?;

    tracing::info!("Initialized project in {}", path.display());
    Ok(InitResult {
        config_path,
        proto_dir_created,
        gitignore_existed,
    })
}
