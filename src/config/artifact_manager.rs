use log::{info, warn};

use crate::config::artifact_config::ArtifactConfig;
use crate::config::default_configs::ArtifactTable;

/// What a single override did to the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideOutcome {
    Added,
    Updated,
    Deleted,
    Ignored,
}

/// Applies `--artifacts` overrides to a copy of the preset table.
///
/// An override has the form `NAME=SOURCE_PATH [ATTR|ATTR=BOOL]...`:
///
/// - `NAME=` removes `NAME` from the table
/// - `NAME=PATH` replaces the source path of an existing entry, or adds a new
///   entry uploading `PATH` with the standard mode only
/// - `ATTR` sets one of `unzip`, `standard`, `chunk`, `chunk_dir` to true,
///   `ATTR=VALUE` sets it from `true/t/1` or `false/f/0` (case-insensitive)
///
/// Malformed overrides are logged and skipped; they never abort the run.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    artifacts: ArtifactTable,
}

impl ArtifactManager {
    /// Create a manager working on a copy of `presets`
    pub fn new(presets: &ArtifactTable) -> Self {
        Self {
            artifacts: presets.clone(),
        }
    }

    /// Apply overrides in order
    pub fn apply_overrides<S: AsRef<str>>(&mut self, overrides: &[S]) {
        for spec in overrides {
            self.apply_override(spec.as_ref());
        }
    }

    /// Apply a single override
    pub fn apply_override(&mut self, spec: &str) -> OverrideOutcome {
        let (name, value) = match spec.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => (name.trim(), value),
            _ => {
                warn!("Artifact override - ignored (invalid): {}", spec);
                return OverrideOutcome::Ignored;
            }
        };

        let mut values = value.split_whitespace();
        let source_path = match values.next() {
            Some(path) => path,
            None => {
                return if self.artifacts.shift_remove(name).is_some() {
                    info!("Artifact delete: {}", spec);
                    OverrideOutcome::Deleted
                } else {
                    warn!("Artifact delete - ignored (name not found): {}", spec);
                    OverrideOutcome::Ignored
                };
            }
        };

        let (mut artifact, outcome) = match self.artifacts.get(name) {
            Some(existing) => {
                info!("Artifact override: {}", spec);
                let mut artifact = existing.clone();
                artifact.source_path = source_path.to_string();
                (artifact, OverrideOutcome::Updated)
            }
            None => {
                info!("Artifact add new: {}", spec);
                (ArtifactConfig::new(source_path, false), OverrideOutcome::Added)
            }
        };

        for token in values {
            apply_attribute(&mut artifact, token);
        }

        info!("Artifact {}: {}", name, artifact);
        if !artifact.is_uploadable() {
            warn!("Artifact {} has no upload mode set and will not be uploaded", name);
        }
        // Updating keeps the entry's position, adding appends it.
        self.artifacts.insert(name.to_string(), artifact);
        outcome
    }

    /// Copy of the current table
    pub fn artifacts(&self) -> ArtifactTable {
        self.artifacts.clone()
    }

    pub fn into_artifacts(self) -> ArtifactTable {
        self.artifacts
    }
}

/// Apply `overrides` to a copy of `presets` and return the result
pub fn override_artifacts<S: AsRef<str>>(presets: &ArtifactTable, overrides: &[S]) -> ArtifactTable {
    let mut manager = ArtifactManager::new(presets);
    manager.apply_overrides(overrides);
    manager.into_artifacts()
}

/// Look up the experiment configs named on the command line.
///
/// Unknown names are logged and skipped.
pub fn select_experiments<S: AsRef<str>>(table: &ArtifactTable, names: &[S]) -> Vec<ArtifactConfig> {
    let mut selected = Vec::new();
    for name in names {
        let name = name.as_ref();
        match table.get(name) {
            Some(config) => {
                info!("Added experiment artifact {}: {}", name, config);
                selected.push(config.clone());
            }
            None => warn!("Ignore invalid experiment_artifacts: {}", name),
        }
    }
    selected
}

fn apply_attribute(artifact: &mut ArtifactConfig, token: &str) {
    let (attr, value) = match token.split_once('=') {
        Some((attr, raw)) => (attr, parse_bool(raw)),
        None => (token, Some(true)),
    };

    let field = match attr {
        "unzip" => &mut artifact.unzip,
        "standard" => &mut artifact.standard,
        "chunk" => &mut artifact.chunk,
        "chunk_dir" => &mut artifact.chunk_dir,
        _ => {
            warn!("Artifact attribute - ignored (unknown): {}", token);
            return;
        }
    };

    match value {
        Some(value) => *field = value,
        None => warn!(
            "Artifact attribute - ignored (invalid boolean), keeping {}={}: {}",
            attr, field, token
        ),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Some(true),
        "false" | "f" | "0" => Some(false),
        _ => None,
    }
}
