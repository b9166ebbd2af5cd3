use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use log::{info, warn};
use regex::Regex;
use walkdir::WalkDir;

use crate::config::get_env_var;
use crate::constants::{CAS_UPLOADER_BIN, CAS_UPLOADER_PATH, CAS_UPLOADER_PREBUILT_PATH, ENV_CLIENT_PATH};
use crate::models::ClientVersion;

lazy_static! {
    static ref VERSION_PATTERN: Regex = Regex::new(r"version: (\d+)\.(\d+)").unwrap();
}

/// Locate the CAS uploader binary.
///
/// Lookup order:
/// 1. `CAS_UPLOADER_PATH` environment variable
/// 2. the client built from source under `source_root`
/// 3. the first prebuilt client found under `source_root`
pub fn find_client(source_root: &Path) -> Result<PathBuf> {
    if let Some(path) = get_env_var(ENV_CLIENT_PATH) {
        let path = PathBuf::from(path);
        if path.is_file() {
            info!("Using client at {}", path.display());
            return Ok(path);
        }
        return Err(anyhow!(
            "{} points to {}, which is not a file",
            ENV_CLIENT_PATH,
            path.display()
        ));
    }

    let bin_path = source_root.join(CAS_UPLOADER_PATH).join(CAS_UPLOADER_BIN);
    if bin_path.is_file() {
        info!("Using client at {}", bin_path.display());
        return Ok(bin_path);
    }

    find_prebuilt_client(&source_root.join(CAS_UPLOADER_PREBUILT_PATH))
}

fn find_prebuilt_client(prebuilt_dir: &Path) -> Result<PathBuf> {
    let client = WalkDir::new(prebuilt_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == CAS_UPLOADER_BIN)
        .map(|entry| entry.into_path())
        .ok_or_else(|| anyhow!("Could not find {} binary", CAS_UPLOADER_BIN))?;

    info!("Using client at {}", client.display());
    Ok(client)
}

/// Parse the output of `casuploader -version`
pub fn parse_client_version(output: &str) -> Option<ClientVersion> {
    let captures = VERSION_PATTERN.captures(output)?;
    let major = captures.get(1)?.as_str().parse().ok()?;
    let minor = captures.get(2)?.as_str().parse().ok()?;
    Some(ClientVersion::new(major, minor))
}

/// Ask the client for its version.
///
/// Any failure yields version 0.0, which disables every optional flag.
pub fn detect_client_version(client_path: &Path) -> ClientVersion {
    let output = match Command::new(client_path).arg("-version").output() {
        Ok(output) => output,
        Err(e) => {
            warn!("Failed to get CAS client version. Error {}", e);
            return ClientVersion::default();
        }
    };

    let text = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() {
        warn!(
            "Failed to get CAS client version. Exit status {}, output: {}",
            output.status,
            text.trim()
        );
        return ClientVersion::default();
    }

    match parse_client_version(&text) {
        Some(version) => {
            info!("CAS client version is {}", version);
            version
        }
        None => {
            warn!("Failed to parse CAS client version. Output: {}", text.trim());
            ClientVersion::default()
        }
    }
}
