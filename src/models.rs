use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ArtifactConfig, Variation};

/// Version of the CAS client binary, compared as (major, minor)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ClientVersion {
    pub major: u32,
    pub minor: u32,
}

impl ClientVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn at_least(&self, (major, minor): (u32, u32)) -> bool {
        *self >= Self::new(major, minor)
    }
}

impl fmt::Display for ClientVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// CAS service and client used for a run. Read-only once established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasInfo {
    pub cas_instance: String,
    pub cas_service: String,
    pub client_path: PathBuf,
    pub client_version: ClientVersion,
}

/// Upload of one variation of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    /// Single-variation config whose `source_path` is the concrete file
    pub artifact: ArtifactConfig,
    /// Unique slot of this upload in the digest manifest
    pub target_key: String,
    /// Scratch directory shared by all tasks of the run
    pub working_dir: PathBuf,
    /// Scratch file owned by this task, receiving the client metrics
    pub metrics_file: PathBuf,
}

impl UploadTask {
    pub fn variation(&self) -> Variation {
        self.artifact.variation()
    }
}

/// Outcome of a successful client invocation
#[derive(Debug, Clone, PartialEq)]
pub struct UploadResult {
    /// Root digest, formatted as `<hash>/<size>`
    pub digest: String,
    /// Details of every uploaded file, when the client dumped them
    pub content_details: Option<Vec<Value>>,
    /// Captured client output
    pub log: String,
}

/// Content of `cas_digests.json`.
///
/// Fields are declared in alphabetical order so the file is key-sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestManifest {
    pub cas_instance: String,
    pub cas_service: String,
    pub client_version: String,
    pub files: BTreeMap<String, String>,
}

/// One entry of `logs/cas_content_details.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentDetailsEntry {
    pub artifact: String,
    pub details: Vec<Value>,
}

/// Metrics of a whole run, exported for telemetry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CasMetrics {
    /// Per-artifact metrics dumped by the client
    pub artifacts: Vec<Value>,
    pub client_version: String,
    pub max_workers: usize,
    pub time_ms: u64,
    pub uploader_version: String,
}

/// What a run produced
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UploadSummary {
    pub total_tasks: usize,
    pub uploaded: usize,
    pub failed: usize,
    pub metrics: CasMetrics,
}
