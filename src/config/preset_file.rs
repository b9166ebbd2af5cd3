use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::config::default_configs::{preset_artifacts, ArtifactTable};

/// Load a preset table from a YAML mapping of name -> artifact config
pub fn load_presets(path: &Path) -> Result<ArtifactTable> {
    let content = fs::read_to_string(path)
        .context(format!("Failed to read preset file: {}", path.display()))?;

    let presets: ArtifactTable = serde_yaml::from_str(&content)
        .context(format!("Failed to parse YAML presets in {}", path.display()))?;

    debug!("Loaded {} presets from {}", presets.len(), path.display());
    Ok(presets)
}

/// Save a preset table as YAML
pub fn save_presets(presets: &ArtifactTable, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(presets).context("Failed to serialize presets to YAML")?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .context(format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, yaml).context(format!("Failed to write presets to {}", path.display()))?;

    info!("Saved {} presets to {}", presets.len(), path.display());
    Ok(())
}

/// Presets from `path` if given, otherwise the built-in table.
///
/// A path that was given but cannot be read or parsed is an error.
pub fn load_or_default_presets(path: Option<&Path>) -> Result<ArtifactTable> {
    match path {
        Some(path) => load_presets(path),
        None => {
            debug!("No preset file provided, using built-in presets");
            Ok(preset_artifacts())
        }
    }
}
