//! Access to the external CAS uploader binary.
//!
//! The binary does all hashing, chunking and transport. This module only
//! knows its command-line contract:
//!
//! ```text
//! casuploader -cas-instance I -cas-addr A -dump-digest F -use-adc
//!     [-zip-path|-file-path|-dir-path P] [-chunk -avg-chunk-size N]
//!     [-exclude-filters R]* [-dump-file-details F2] [-dump-metrics F3]
//! ```
//!
//! [`CasClient`] is the seam between the uploader and the binary, so tests can
//! substitute the process without touching the orchestration.

pub mod command;
pub mod discovery;

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

pub use command::{build_upload_args, prepare_path_flag, ClientFeatures, OutputFiles, PathFlag};
pub use discovery::{detect_client_version, find_client, parse_client_version};

/// Result of a client run that started and finished within its timeout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// stdout followed by stderr
    pub log: String,
}

/// Capability to run the CAS uploader with a given argument list.
///
/// `Err` means the run never completed: the process could not be started or
/// exceeded `timeout`. A process that exited on its own returns `Ok`, with
/// `success` telling whether the exit code was zero.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CasClient: Send + Sync {
    async fn run(&self, args: Vec<String>, timeout: Duration) -> Result<ClientOutput>;
}

/// Runs the uploader binary as a child process
#[derive(Debug, Clone)]
pub struct ProcessClient {
    path: PathBuf,
}

impl ProcessClient {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CasClient for ProcessClient {
    async fn run(&self, args: Vec<String>, timeout: Duration) -> Result<ClientOutput> {
        debug!("Running command: {} {:?}", self.path.display(), args);

        let child = Command::new(&self.path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .context(format!("Failed to start CAS client {}", self.path.display()))?;

        // Dropping the child on timeout kills it.
        let output = tokio::time::timeout(timeout, child.wait_with_output())
            .await
            .map_err(|_| anyhow!("CAS client timed out after {} seconds", timeout.as_secs()))?
            .context("Failed to wait for CAS client")?;

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        log.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ClientOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            log,
        })
    }
}
