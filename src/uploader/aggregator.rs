use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::constants::{CONTENT_DETAILS_PATH, DIGESTS_PATH};
use crate::models::{
    CasInfo, CasMetrics, ContentDetailsEntry, DigestManifest, UploadResult, UploadSummary, UploadTask,
};

/// Folds task results, in whatever order they complete, into the digest
/// manifest, the content-details list and the run metrics.
///
/// Owned by the single loop consuming results, so it needs no locking.
#[derive(Debug, Default)]
pub struct ResultAggregator {
    digests: BTreeMap<String, String>,
    content_details: Vec<ContentDetailsEntry>,
    metrics: CasMetrics,
    total_tasks: usize,
    failed: usize,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one task and consume its metrics file
    pub fn record(&mut self, task: &UploadTask, result: Option<UploadResult>) {
        self.total_tasks += 1;

        match result {
            Some(result) => {
                info!("Uploaded {}: {}", task.target_key, result.digest);
                self.digests.insert(task.target_key.clone(), result.digest);

                if let Some(details) = result.content_details {
                    if !details.is_empty() {
                        self.content_details.push(ContentDetailsEntry {
                            artifact: task.target_key.clone(),
                            details,
                        });
                    }
                }
            }
            None => self.failed += 1,
        }

        self.fold_metrics_file(&task.metrics_file);
    }

    fn fold_metrics_file(&mut self, metrics_file: &Path) {
        if !metrics_file.exists() {
            return;
        }

        match fs::read_to_string(metrics_file) {
            Ok(content) if content.trim().is_empty() => {
                debug!("Empty metrics file: {}", metrics_file.display());
            }
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(value @ Value::Object(_)) => self.metrics.artifacts.push(value),
                Ok(_) => warn!("Metrics file {} is not a JSON object", metrics_file.display()),
                Err(e) => warn!("Failed to parse metrics file {}: {}", metrics_file.display(), e),
            },
            Err(e) => warn!("Failed to read metrics file {}: {}", metrics_file.display(), e),
        }

        if let Err(e) = fs::remove_file(metrics_file) {
            warn!("Failed to remove metrics file {}: {}", metrics_file.display(), e);
        }
    }

    pub fn digests(&self) -> &BTreeMap<String, String> {
        &self.digests
    }

    pub fn content_details(&self) -> &[ContentDetailsEntry] {
        &self.content_details
    }

    pub fn metrics(&self) -> &CasMetrics {
        &self.metrics
    }

    /// Write `cas_digests.json` and `logs/cas_content_details.json` under
    /// `dist_dir`. Both are written even when nothing was uploaded.
    pub fn write_outputs(&mut self, cas_info: &CasInfo, dist_dir: &Path) -> Result<()> {
        let manifest = DigestManifest {
            cas_instance: cas_info.cas_instance.clone(),
            cas_service: cas_info.cas_service.clone(),
            client_version: cas_info.client_version.to_string(),
            files: self.digests.clone(),
        };
        write_json(&dist_dir.join(DIGESTS_PATH), &manifest)?;

        // Completion order is arbitrary; keep the file stable between runs.
        self.content_details.sort_by(|a, b| a.artifact.cmp(&b.artifact));
        let details: Vec<Value> = self
            .content_details
            .iter()
            .map(sorted_value)
            .collect::<Result<_>>()?;
        write_json(&dist_dir.join(CONTENT_DETAILS_PATH), &details)?;

        info!(
            "Wrote {} digests to {}",
            self.digests.len(),
            dist_dir.join(DIGESTS_PATH).display()
        );
        Ok(())
    }

    pub fn finish(self) -> UploadSummary {
        UploadSummary {
            total_tasks: self.total_tasks,
            uploaded: self.digests.len(),
            failed: self.failed,
            metrics: self.metrics,
        }
    }
}

/// Round-trip through `Value` so object keys come out sorted
fn sorted_value<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).context("Failed to serialize output")
}

/// Write pretty-printed JSON, creating the parent directory
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context(format!("Failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    fs::write(path, json).context(format!("Failed to write {}", path.display()))?;
    Ok(())
}
