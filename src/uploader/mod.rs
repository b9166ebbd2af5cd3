//! Upload orchestration.
//!
//! A run goes through three stages:
//!
//! 1. [`TaskResolver`] globs every artifact config against the build output
//!    directory and expands the matches into deduplicated upload tasks.
//! 2. [`UploadExecutor`] runs the CAS client for every task on a bounded
//!    worker pool.
//! 3. [`ResultAggregator`] folds the results, in completion order, into the
//!    digest manifest, the content-details list and the run metrics.
//!
//! [`Uploader`] ties the stages together for a single run.

pub mod aggregator;
pub mod executor;
pub mod glob;
pub mod resolver;

use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::info;
use rand::Rng;

use crate::client::CasClient;
use crate::config::ArtifactConfig;
use crate::constants::{CAS_METRICS_PATH, MAX_WORKERS_LOWER_BOUND, MAX_WORKERS_UPPER_BOUND, UPLOADER_VERSION};
use crate::models::{CasInfo, CasMetrics, UploadSummary};

pub use aggregator::{write_json, ResultAggregator};
pub use executor::{parse_content_details, UploadExecutor};
pub use glob::{find_matches, GlobPattern};
pub use resolver::{ResolvedUpload, TaskResolver};

/// Uploads artifacts of one build output directory to a CAS instance
pub struct Uploader<C: CasClient> {
    cas_info: CasInfo,
    executor: UploadExecutor<C>,
}

impl<C: CasClient> Uploader<C> {
    pub fn new(cas_info: CasInfo, client: C) -> Self {
        Self {
            executor: UploadExecutor::new(cas_info.clone(), client),
            cas_info,
        }
    }

    /// Override the per-invocation client timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.executor = self.executor.with_timeout(timeout);
        self
    }

    pub fn cas_info(&self) -> &CasInfo {
        &self.cas_info
    }

    /// Upload every file matching `artifacts` under `dist_dir` and write the
    /// digest and content-details manifests.
    ///
    /// Individual upload failures only show up as missing manifest keys; the
    /// returned error covers the scratch directory and the manifest writes.
    pub async fn upload(
        &self,
        artifacts: &[ArtifactConfig],
        dist_dir: &Path,
        max_workers: usize,
    ) -> Result<UploadSummary> {
        let start = Instant::now();

        let working_dir = tempfile::Builder::new()
            .prefix("cas-upload-")
            .tempdir()
            .context("Failed to create working directory")?;
        info!("The working dir is {}", working_dir.path().display());

        let tasks = TaskResolver::new(dist_dir).resolve(artifacts, working_dir.path())?;
        info!("Uploading {} files, max workers = {}", tasks.len(), max_workers);

        let mut aggregator = ResultAggregator::new();
        self.executor.run(tasks, max_workers, &mut aggregator).await;
        aggregator.write_outputs(&self.cas_info, dist_dir)?;

        let mut summary = aggregator.finish();
        let elapsed = start.elapsed();
        info!(
            "Total time of uploading build artifacts to CAS: {} seconds",
            elapsed.as_secs()
        );

        summary.metrics.time_ms = elapsed.as_millis() as u64;
        summary.metrics.client_version = self.cas_info.client_version.to_string();
        summary.metrics.uploader_version = UPLOADER_VERSION.to_string();
        summary.metrics.max_workers = max_workers;
        Ok(summary)
    }

    /// Blocking wrapper around [`Uploader::upload`] on a fresh runtime
    pub fn upload_blocking(
        &self,
        artifacts: &[ArtifactConfig],
        dist_dir: &Path,
        max_workers: usize,
    ) -> Result<UploadSummary> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(max_workers.max(1))
            .enable_all()
            .build()
            .context("Failed to create Tokio runtime")?;

        runtime.block_on(self.upload(artifacts, dist_dir, max_workers))
    }
}

/// Print the uploads a run would perform, without uploading anything.
///
/// Only reads `dist_dir`. Returns the number of uploads.
pub fn dry_run<W: Write>(artifacts: &[ArtifactConfig], dist_dir: &Path, out: &mut W) -> Result<usize> {
    let uploads = TaskResolver::new(dist_dir).resolve_uploads(artifacts);
    write_plan(&uploads, out).context("Failed to print upload plan")?;
    Ok(uploads.len())
}

/// One line per upload: key, unzip marker and source path, then the total
pub fn write_plan<W: Write>(uploads: &[ResolvedUpload], out: &mut W) -> io::Result<()> {
    for upload in uploads {
        let unzip = if upload.artifact.unzip { '+' } else { '-' };
        writeln!(out, "{:<40} {} {}", upload.target_key, unzip, upload.artifact.source_path)?;
    }
    writeln!(out, "Total: {} files.", uploads.len())
}

/// Random worker count within the configured bounds
pub fn random_max_workers() -> usize {
    rand::thread_rng().gen_range(MAX_WORKERS_LOWER_BOUND..=MAX_WORKERS_UPPER_BOUND)
}

/// Write the run metrics to `logs/cas_metrics.json` under `dist_dir`
pub fn write_metrics(metrics: &CasMetrics, dist_dir: &Path) -> Result<()> {
    let path = dist_dir.join(CAS_METRICS_PATH);
    write_json(&path, metrics)?;
    info!("Output cas metrics to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientOutput, MockCasClient};
    use crate::constants::{CONTENT_DETAILS_PATH, DIGESTS_PATH};
    use crate::models::ClientVersion;
    use crate::test_utils::{create_dist_dir, flag_value, test_cas_info};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_random_max_workers_in_bounds() {
        for _ in 0..100 {
            let workers = random_max_workers();
            assert!((MAX_WORKERS_LOWER_BOUND..=MAX_WORKERS_UPPER_BOUND).contains(&workers));
        }
    }

    #[test]
    fn test_write_plan() {
        let uploads = vec![
            ResolvedUpload {
                artifact: ArtifactConfig::new("/dist/android-cts.zip", true),
                target_key: "android-cts.zip".to_string(),
            },
            ResolvedUpload {
                artifact: ArtifactConfig::new("/dist/radio.img", false),
                target_key: "radio.img".to_string(),
            },
        ];

        let mut out = Vec::new();
        write_plan(&uploads, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            format!(
                "{:<40} + /dist/android-cts.zip\n{:<40} - /dist/radio.img\nTotal: 2 files.\n",
                "android-cts.zip", "radio.img"
            )
        );
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = create_dist_dir(&["oriole-img-1.zip", "a.apk"]).unwrap();
        let config = ArtifactConfig::new("*-img-*zip", true).with_chunk(true);

        let mut out = Vec::new();
        let count = dry_run(&[config, ArtifactConfig::new("*.apk", false)], dir.path(), &mut out).unwrap();

        assert_eq!(count, 3);
        assert!(String::from_utf8(out).unwrap().ends_with("Total: 3 files.\n"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_upload_end_to_end() {
        let dir = create_dist_dir(&["oriole-img-1.zip"]).unwrap();
        let mut client = MockCasClient::new();
        client.expect_run().times(2).returning(|args, _| {
            let digest = flag_value(&args, "-dump-digest").unwrap();
            let chunked_dir = flag_value(&args, "-zip-path").is_some();
            fs::write(digest, if chunked_dir { "dir/2" } else { "file/1" }).unwrap();
            Ok(ClientOutput {
                success: true,
                exit_code: Some(0),
                log: String::new(),
            })
        });

        let config = ArtifactConfig::new("*-img-*zip", false)
            .with_standard(false)
            .with_chunk(true)
            .with_chunk_dir(true);
        let uploader = Uploader::new(test_cas_info(ClientVersion::new(1, 3)), client);
        let summary = tokio_test::block_on(uploader.upload(&[config], dir.path(), 2)).unwrap();

        assert_eq!((summary.total_tasks, summary.uploaded, summary.failed), (2, 2, 0));
        assert_eq!(summary.metrics.client_version, "1.3");
        assert_eq!(summary.metrics.uploader_version, UPLOADER_VERSION);
        assert_eq!(summary.metrics.max_workers, 2);

        let manifest: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(DIGESTS_PATH)).unwrap()).unwrap();
        assert_eq!(manifest["files"]["_chunked_oriole-img-1.zip"], "file/1");
        assert_eq!(manifest["files"]["_chunked_dir_oriole-img-1.zip"], "dir/2");
        assert!(dir.path().join(CONTENT_DETAILS_PATH).exists());
    }

    #[test]
    fn test_write_metrics() {
        let dir = TempDir::new().unwrap();
        let metrics = CasMetrics {
            max_workers: 4,
            time_ms: 1200,
            ..Default::default()
        };
        write_metrics(&metrics, dir.path()).unwrap();

        let written: CasMetrics =
            serde_json::from_str(&fs::read_to_string(dir.path().join(CAS_METRICS_PATH)).unwrap()).unwrap();
        assert_eq!(written, metrics);
    }
}
