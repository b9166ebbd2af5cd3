use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use rayon::prelude::*;
use tempfile::NamedTempFile;

use crate::config::ArtifactConfig;
use crate::models::UploadTask;
use crate::uploader::glob::{find_matches, relative_key};

/// A file and variation selected for upload, before any scratch state exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUpload {
    /// Single-variation config whose `source_path` is the concrete file
    pub artifact: ArtifactConfig,
    pub target_key: String,
}

/// Expands artifact configs into deduplicated uploads.
///
/// Configs are globbed in parallel; deduplication runs afterwards in config
/// order, so the first config producing a given manifest key wins it.
#[derive(Debug, Clone)]
pub struct TaskResolver {
    dist_dir: PathBuf,
}

impl TaskResolver {
    pub fn new(dist_dir: impl Into<PathBuf>) -> Self {
        Self {
            dist_dir: dist_dir.into(),
        }
    }

    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    /// Resolve uploads without touching the filesystem beyond reading it
    pub fn resolve_uploads(&self, artifacts: &[ArtifactConfig]) -> Vec<ResolvedUpload> {
        let matches: Vec<Vec<PathBuf>> = artifacts
            .par_iter()
            .map(|artifact| {
                if !artifact.is_uploadable() {
                    warn!("No upload mode set for {}, skipping", artifact.source_path);
                    return Vec::new();
                }
                find_matches(&self.dist_dir, &artifact.source_path)
            })
            .collect();

        let mut seen = HashSet::new();
        let mut uploads = Vec::new();

        for (artifact, files) in artifacts.iter().zip(matches) {
            if files.is_empty() {
                debug!("No file matches {}", artifact.source_path);
            }

            for file in files {
                if !file.is_file() {
                    warn!("Ignore artifact match (dir): {}", file.display());
                    continue;
                }

                let relative_path = match relative_key(&self.dist_dir, &file) {
                    Some(relative_path) => relative_path,
                    None => {
                        warn!(
                            "Ignore artifact match {}: not under {}",
                            file.display(),
                            self.dist_dir.display()
                        );
                        continue;
                    }
                };

                let source_path = file.to_string_lossy().into_owned();
                for variation in artifact.variations() {
                    let target_key = variation.target_key(&relative_path);
                    if !seen.insert(target_key.clone()) {
                        debug!("Skip duplicate upload of {}", target_key);
                        continue;
                    }

                    uploads.push(ResolvedUpload {
                        artifact: variation.to_config(source_path.as_str(), &artifact.exclude_filters),
                        target_key,
                    });
                }
            }
        }

        info!("Resolved {} uploads from {} artifact configs", uploads.len(), artifacts.len());
        uploads
    }

    /// Resolve uploads into tasks, each with its own empty metrics file in
    /// `working_dir`
    pub fn resolve(&self, artifacts: &[ArtifactConfig], working_dir: &Path) -> Result<Vec<UploadTask>> {
        self.resolve_uploads(artifacts)
            .into_iter()
            .map(|upload| {
                let metrics_file = NamedTempFile::new_in(working_dir)
                    .context(format!("Failed to create metrics file in {}", working_dir.display()))?
                    .into_temp_path()
                    .keep()
                    .context("Failed to keep metrics file")?;

                Ok(UploadTask {
                    artifact: upload.artifact,
                    target_key: upload.target_key,
                    working_dir: working_dir.to_path_buf(),
                    metrics_file,
                })
            })
            .collect()
    }
}
