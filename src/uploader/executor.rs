use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::sync::Semaphore;

use crate::client::{build_upload_args, prepare_path_flag, CasClient, ClientFeatures, OutputFiles};
use crate::constants::UPLOADER_TIMEOUT_SECS;
use crate::models::{CasInfo, UploadResult, UploadTask};
use crate::security::scrub_credentials;
use crate::uploader::aggregator::ResultAggregator;

/// Runs upload tasks through a [`CasClient`] with bounded concurrency.
///
/// A failing task only loses its own result: every error of a single upload
/// is logged and turned into `None`.
pub struct UploadExecutor<C: CasClient> {
    cas_info: CasInfo,
    client: Arc<C>,
    features: ClientFeatures,
    timeout: Duration,
}

impl<C: CasClient> UploadExecutor<C> {
    pub fn new(cas_info: CasInfo, client: C) -> Self {
        let features = ClientFeatures::for_version(cas_info.client_version);
        features.log_missing(cas_info.client_version);

        Self {
            cas_info,
            client: Arc::new(client),
            features,
            timeout: Duration::from_secs(UPLOADER_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn features(&self) -> ClientFeatures {
        self.features
    }

    /// Upload every task with at most `max_workers` client runs in flight,
    /// folding each result into `aggregator` as soon as it completes.
    pub async fn run(&self, tasks: Vec<UploadTask>, max_workers: usize, aggregator: &mut ResultAggregator) {
        let semaphore = Semaphore::new(max_workers.max(1));

        let mut pending: FuturesUnordered<_> = tasks
            .into_iter()
            .map(|task| {
                let semaphore = &semaphore;
                async move {
                    // The semaphore is never closed
                    let _permit = semaphore.acquire().await.ok();
                    let result = self.upload_artifact(&task).await;
                    (task, result)
                }
            })
            .collect();

        while let Some((task, result)) = pending.next().await {
            if result.is_none() {
                warn!(
                    "Skip to save the digest of file {}, the uploading may fail",
                    task.target_key
                );
            }
            aggregator.record(&task, result);
        }
    }

    /// Upload a single task. Never fails: errors are logged and yield `None`.
    pub async fn upload_artifact(&self, task: &UploadTask) -> Option<UploadResult> {
        match self.try_upload(task).await {
            Ok(result) => result,
            Err(e) => {
                warn!(
                    "Failed to upload {} to CAS instance {}. Skip.\nError: {}",
                    task.artifact.source_path,
                    self.cas_info.cas_instance,
                    scrub_credentials(&format!("{:#}", e))
                );
                None
            }
        }
    }

    async fn try_upload(&self, task: &UploadTask) -> Result<Option<UploadResult>> {
        let artifact = &task.artifact;
        let digest_file = NamedTempFile::new_in(&task.working_dir)
            .context(format!("Failed to create digest file in {}", task.working_dir.display()))?;
        let details_file = NamedTempFile::new_in(&task.working_dir)
            .context(format!("Failed to create details file in {}", task.working_dir.display()))?;
        let path_flag = prepare_path_flag(artifact, &task.working_dir)?;

        let args = build_upload_args(
            &self.cas_info,
            artifact,
            &path_flag,
            self.features,
            OutputFiles {
                digest: digest_file.path(),
                content_details: details_file.path(),
                metrics: &task.metrics_file,
            },
        );

        info!("Uploading {} ({}) as {}", artifact.source_path, task.variation(), task.target_key);
        let output = self.client.run(args, self.timeout).await?;
        if !output.success {
            warn!(
                "Failed to upload {} to CAS instance {}. Skip.\nExit code: {:?}\nLog: {}",
                artifact.source_path,
                self.cas_info.cas_instance,
                output.exit_code,
                scrub_credentials(&output.log)
            );
            return Ok(None);
        }
        debug!("Client output for {}:\n{}", task.target_key, scrub_credentials(&output.log));

        let digest = tokio::fs::read_to_string(digest_file.path())
            .await
            .context("Failed to read dumped digest")?
            .trim()
            .to_string();
        if digest.is_empty() {
            warn!(
                "No digest is dumped for file {}, the uploading may fail.",
                artifact.source_path
            );
            return Ok(None);
        }
        info!("Uploaded {} to CAS. Digest: {}", artifact.source_path, digest);

        let content_details = if self.features.file_details {
            match tokio::fs::read_to_string(details_file.path()).await {
                Ok(text) => parse_content_details(&text),
                Err(e) => {
                    warn!("Failed to read uploaded content details: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Some(UploadResult {
            digest,
            content_details,
            log: output.log,
        }))
    }
}

/// Parse the `-dump-file-details` output, a JSON list
pub fn parse_content_details(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str(text) {
        Ok(details) => Some(details),
        Err(e) => {
            warn!("Failed to parse uploaded content details: {}", e);
            None
        }
    }
}
