use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use tempfile::TempDir;

use crate::config::{ArtifactConfig, Variation};
use crate::constants::{AVG_CHUNK_SIZE_IN_KB, FILE_DETAILS_MIN_VERSION, METRICS_MIN_VERSION};
use crate::models::{CasInfo, ClientVersion};

/// Optional client flags supported by the detected client version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientFeatures {
    /// `-dump-file-details`
    pub file_details: bool,
    /// `-dump-metrics`
    pub metrics: bool,
}

impl ClientFeatures {
    pub fn for_version(version: ClientVersion) -> Self {
        Self {
            file_details: version.at_least(FILE_DETAILS_MIN_VERSION),
            metrics: version.at_least(METRICS_MIN_VERSION),
        }
    }

    /// Log the flags that will be left out of every command
    pub fn log_missing(&self, version: ClientVersion) {
        if !self.file_details {
            warn!("-dump-file-details is not enabled (client version {})", version);
        }
        if !self.metrics {
            warn!("-dump-metrics is not enabled (client version {})", version);
        }
    }
}

/// Path argument of a client command.
///
/// For [`Variation::Directory`] the file is copied into a private scratch
/// directory, removed when this value is dropped.
#[derive(Debug)]
pub struct PathFlag {
    pub flag: &'static str,
    pub path: PathBuf,
    _scratch: Option<TempDir>,
}

impl PathFlag {
    fn new(flag: &'static str, path: impl Into<PathBuf>) -> Self {
        Self {
            flag,
            path: path.into(),
            _scratch: None,
        }
    }
}

/// Determine the path flag for an artifact resolved to a single variation
pub fn prepare_path_flag(artifact: &ArtifactConfig, working_dir: &Path) -> Result<PathFlag> {
    match artifact.variation() {
        Variation::Standard { unzip: true } | Variation::ChunkDir => {
            Ok(PathFlag::new("-zip-path", &artifact.source_path))
        }
        Variation::Standard { unzip: false } | Variation::Chunk => {
            Ok(PathFlag::new("-file-path", &artifact.source_path))
        }
        Variation::Directory => {
            let source = Path::new(&artifact.source_path);
            let scratch = tempfile::Builder::new()
                .prefix("dir-")
                .tempdir_in(working_dir)
                .context(format!("Failed to create scratch directory in {}", working_dir.display()))?;
            let file_name = source
                .file_name()
                .context(format!("No file name in {}", source.display()))?;
            fs::copy(source, scratch.path().join(file_name))
                .context(format!("Failed to copy {} into scratch directory", source.display()))?;

            Ok(PathFlag {
                flag: "-dir-path",
                path: scratch.path().to_path_buf(),
                _scratch: Some(scratch),
            })
        }
    }
}

/// Scratch files a single client run writes its results to
#[derive(Debug, Clone, Copy)]
pub struct OutputFiles<'a> {
    pub digest: &'a Path,
    pub content_details: &'a Path,
    pub metrics: &'a Path,
}

/// Build the full argument list (without the program) of an upload
pub fn build_upload_args(
    cas_info: &CasInfo,
    artifact: &ArtifactConfig,
    path_flag: &PathFlag,
    features: ClientFeatures,
    files: OutputFiles<'_>,
) -> Vec<String> {
    let mut args = vec![
        "-cas-instance".to_string(),
        cas_info.cas_instance.clone(),
        "-cas-addr".to_string(),
        cas_info.cas_service.clone(),
        "-dump-digest".to_string(),
        files.digest.display().to_string(),
        "-use-adc".to_string(),
        path_flag.flag.to_string(),
        path_flag.path.display().to_string(),
    ];

    if artifact.chunk || artifact.chunk_dir {
        args.push("-chunk".to_string());
        args.push("-avg-chunk-size".to_string());
        args.push(AVG_CHUNK_SIZE_IN_KB.to_string());
    }

    for exclude_filter in &artifact.exclude_filters {
        args.push("-exclude-filters".to_string());
        args.push(exclude_filter.clone());
    }

    if features.file_details {
        args.push("-dump-file-details".to_string());
        args.push(files.content_details.display().to_string());
    }

    if features.metrics {
        args.push("-dump-metrics".to_string());
        args.push(files.metrics.display().to_string());
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cas_info(version: ClientVersion) -> CasInfo {
        CasInfo {
            cas_instance: "instance".to_string(),
            cas_service: "service".to_string(),
            client_path: PathBuf::from("casuploader"),
            client_version: version,
        }
    }

    fn files() -> OutputFiles<'static> {
        OutputFiles {
            digest: Path::new("/tmp/digest"),
            content_details: Path::new("/tmp/details"),
            metrics: Path::new("/tmp/metrics"),
        }
    }

    fn args_for(artifact: &ArtifactConfig, version: ClientVersion) -> Vec<String> {
        let path_flag = prepare_path_flag(artifact, Path::new("/tmp")).unwrap();
        build_upload_args(
            &cas_info(version),
            artifact,
            &path_flag,
            ClientFeatures::for_version(version),
            files(),
        )
    }

    fn contains_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[test]
    fn test_features_by_version() {
        assert_eq!(
            ClientFeatures::for_version(ClientVersion::new(0, 9)),
            ClientFeatures { file_details: false, metrics: false }
        );
        assert_eq!(
            ClientFeatures::for_version(ClientVersion::new(1, 2)),
            ClientFeatures { file_details: true, metrics: false }
        );
        assert_eq!(
            ClientFeatures::for_version(ClientVersion::new(1, 3)),
            ClientFeatures { file_details: true, metrics: true }
        );
    }

    #[test]
    fn test_standard_version_flags() {
        let artifact = ArtifactConfig::new("/dist/radio.img", false);
        let args = args_for(&artifact, ClientVersion::new(1, 3));

        assert_eq!(
            &args[..9],
            &[
                "-cas-instance", "instance", "-cas-addr", "service", "-dump-digest",
                "/tmp/digest", "-use-adc", "-file-path", "/dist/radio.img",
            ]
        );
        assert!(!args.contains(&"-chunk".to_string()));
        assert!(contains_pair(&args, "-dump-file-details", "/tmp/details"));
        assert!(contains_pair(&args, "-dump-metrics", "/tmp/metrics"));
    }

    #[test]
    fn test_standard_unzip_version_flags() {
        let artifact = ArtifactConfig::new("/dist/android-cts.zip", true)
            .with_exclude_filters(["android-cts/jdk/.*", "android-cts/tmp/.*"]);
        let args = args_for(&artifact, ClientVersion::new(1, 3));

        assert!(contains_pair(&args, "-zip-path", "/dist/android-cts.zip"));
        assert!(!args.contains(&"-chunk".to_string()));
        assert!(contains_pair(&args, "-exclude-filters", "android-cts/jdk/.*"));
        assert!(contains_pair(&args, "-exclude-filters", "android-cts/tmp/.*"));
    }

    #[test]
    fn test_chunk_version_flags() {
        let artifact = Variation::Chunk.to_config("/dist/oriole-img-1.zip", &[]);
        let args = args_for(&artifact, ClientVersion::new(1, 3));

        assert!(contains_pair(&args, "-file-path", "/dist/oriole-img-1.zip"));
        assert!(contains_pair(&args, "-chunk", "-avg-chunk-size"));
        assert!(contains_pair(&args, "-avg-chunk-size", "128"));
    }

    #[test]
    fn test_chunk_dir_version_flags() {
        let artifact = Variation::ChunkDir.to_config("/dist/oriole-img-1.zip", &[]);
        let args = args_for(&artifact, ClientVersion::new(1, 3));

        assert!(contains_pair(&args, "-zip-path", "/dist/oriole-img-1.zip"));
        assert!(args.contains(&"-chunk".to_string()));
        assert!(!args.contains(&"-file-path".to_string()));
    }

    #[test]
    fn test_old_client_omits_optional_flags() {
        let artifact = ArtifactConfig::new("/dist/a.apk", false);
        let args = args_for(&artifact, ClientVersion::new(0, 0));
        assert!(!args.contains(&"-dump-file-details".to_string()));
        assert!(!args.contains(&"-dump-metrics".to_string()));
    }

    #[test]
    fn test_directory_fallback_copies_into_scratch() {
        let working_dir = TempDir::new().unwrap();
        let source = working_dir.path().join("bootloader.img");
        fs::write(&source, b"boot").unwrap();

        let artifact = Variation::Directory.to_config(source.display().to_string(), &[]);
        let path_flag = prepare_path_flag(&artifact, working_dir.path()).unwrap();

        assert_eq!(path_flag.flag, "-dir-path");
        assert!(path_flag.path.starts_with(working_dir.path()));
        assert_eq!(fs::read(path_flag.path.join("bootloader.img")).unwrap(), b"boot");

        let scratch = path_flag.path.clone();
        drop(path_flag);
        assert!(!scratch.exists());
    }

    #[test]
    fn test_directory_fallback_missing_source() {
        let working_dir = TempDir::new().unwrap();
        let artifact = Variation::Directory.to_config("/nonexistent/file.img", &[]);
        assert!(prepare_path_flag(&artifact, working_dir.path()).is_err());
    }
}
