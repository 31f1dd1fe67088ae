//! Filesystem operations
//!
//! Handles file and directory operations.

use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Write content to a file, replacing any previous content
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a file if it exists
///
/// Returns whether a file was removed.
pub fn remove_file_if_exists(path: &Path) -> Result<bool, FilesystemError> {
    if !path.is_file() {
        return Ok(false);
    }
    std::fs::remove_file(path).map_err(|e| FilesystemError::RemoveFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    Ok(true)
}

/// Make a path absolute without touching the filesystem
///
/// Relative paths are joined onto the current directory; `.` and `..`
/// components are folded lexically so the result is stable across runs.
pub fn absolutize(path: &Path) -> Result<PathBuf, FilesystemError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| FilesystemError::Absolutize {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?
            .join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

/// Render a local path as a percent-encoded `file://` URI
///
/// Relative paths are made absolute first.
pub fn file_uri(path: &Path) -> Result<String, FilesystemError> {
    let absolute = absolutize(path)?;
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| FilesystemError::Absolutize {
            path: absolute.clone(),
            error: "path cannot be expressed as a file URI".to_string(),
        })
}
