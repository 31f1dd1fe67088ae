//! CLI command for `protopack templates`
//!
//! Exports the built-in templates as a starting point for overrides.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::output::{is_json, print_detail, print_success};
use crate::core::render::export_builtin;

/// Execute `templates export`
pub fn export(dir: &Path, force: bool) -> Result<()> {
    let written = export_builtin(dir, force)
        .with_context(|| format!("Failed to export templates to {}", dir.display()))?;

    if is_json() {
        let value = serde_json::json!({
            "status": "success",
            "directory": dir,
            "files": written,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    print_success(&format!(
        "Exported {} templates to {}",
        written.len(),
        dir.display()
    ));
    print_detail(&format!(
        "Set templates_dir = \"{}\" under [build] to use them",
        dir.display()
    ));
    Ok(())
}
