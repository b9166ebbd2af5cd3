//! Test utilities for content_uploader
//!
//! Builders for fake build output directories, CAS settings and scripted
//! clients shared by the unit tests.

#![cfg(test)]

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

use crate::models::{CasInfo, ClientVersion};

/// Creates a build output directory containing `files`, each holding its
/// own relative path as content
pub fn create_dist_dir(files: &[&str]) -> Result<TempDir> {
    let dist_dir = TempDir::new()?;
    for file in files {
        let path = dist_dir.path().join(file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, file.as_bytes())?;
    }
    Ok(dist_dir)
}

/// Creates a temporary file with the given content
pub fn create_temp_file(content: &[u8]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    use std::io::Write;
    file.write_all(content)?;
    file.flush()?;
    Ok(file)
}

/// Creates a YAML preset file with two artifacts
pub fn create_test_presets() -> Result<NamedTempFile> {
    let presets = r#"
cts:
  source_path: "android-cts.zip"
  unzip: true
  exclude_filters:
    - "android-cts/jdk/.*"
img:
  source_path: "./*-img-*zip"
  standard: false
  chunk: true
"#;

    create_temp_file(presets.as_bytes())
}

/// CAS settings pointing at a fake instance
pub fn test_cas_info(version: ClientVersion) -> CasInfo {
    CasInfo {
        cas_instance: "projects/test/instances/default".to_string(),
        cas_service: "cas.example.com:443".to_string(),
        client_path: PathBuf::from("casuploader"),
        client_version: version,
    }
}

/// Value following `flag` in a client argument list
pub fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Writes an executable shell script named `casuploader` into `dir`
#[cfg(unix)]
pub fn write_script_client(dir: &Path, body: &str) -> Result<PathBuf> {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(crate::constants::CAS_UPLOADER_BIN);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body))?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dist_dir() -> Result<()> {
        let dist_dir = create_dist_dir(&["a.zip", "sub/b.apk"])?;
        assert_eq!(fs::read_to_string(dist_dir.path().join("sub/b.apk"))?, "sub/b.apk");
        Ok(())
    }

    #[test]
    fn test_flag_value() {
        let args: Vec<String> = ["-dump-digest", "/tmp/d", "-use-adc"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(flag_value(&args, "-dump-digest"), Some("/tmp/d"));
        assert_eq!(flag_value(&args, "-use-adc"), None);
        assert_eq!(flag_value(&args, "-zip-path"), None);
    }

    #[test]
    fn test_presets_parse() -> Result<()> {
        let file = create_test_presets()?;
        let presets = crate::config::load_presets(file.path())?;
        assert_eq!(presets.keys().collect::<Vec<_>>(), vec!["cts", "img"]);
        Ok(())
    }
}
