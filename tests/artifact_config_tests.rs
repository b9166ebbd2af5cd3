//! Integration tests for artifact selection: preset tables, command-line
//! overrides, experiment configs and the resulting client command lines.

use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use content_uploader::client::{CasClient, ClientOutput};
use content_uploader::config::{
    experiment_artifacts, load_presets, override_artifacts, preset_artifacts, save_presets,
    select_experiments, ArtifactConfig,
};
use content_uploader::models::{CasInfo, ClientVersion};
use content_uploader::uploader::{TaskResolver, Uploader};

/// In-process client recording every argument list and dumping a fixed digest
#[derive(Clone, Default)]
struct RecordingClient {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
}

#[async_trait]
impl CasClient for RecordingClient {
    async fn run(&self, args: Vec<String>, _timeout: Duration) -> Result<ClientOutput> {
        if let Some(i) = args.iter().position(|a| a == "-dump-digest") {
            fs::write(&args[i + 1], "0123abcd/42")?;
        }
        self.calls.lock().unwrap().push(args);
        Ok(ClientOutput {
            success: true,
            exit_code: Some(0),
            log: String::new(),
        })
    }
}

fn cas_info() -> CasInfo {
    CasInfo {
        cas_instance: "instance".to_string(),
        cas_service: "service".to_string(),
        client_path: "casuploader".into(),
        client_version: ClientVersion::new(1, 3),
    }
}

fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
    args.windows(2).any(|w| w[0] == flag && w[1] == value)
}

#[tokio::test]
async fn test_chunk_only_image_command_lines() -> Result<()> {
    let dist_dir = TempDir::new()?;
    let image = dist_dir.path().join("oriole-img-1.zip");
    fs::write(&image, b"image")?;
    let image = image.to_string_lossy().into_owned();

    let artifacts = override_artifacts(
        &preset_artifacts(),
        &["img=*-img-*zip standard=false chunk chunk_dir"],
    );
    let img = artifacts["img"].clone();

    let client = RecordingClient::default();
    let uploader = Uploader::new(cas_info(), client.clone());
    let summary = uploader.upload(&[img], dist_dir.path(), 2).await?;
    assert_eq!(summary.uploaded, 2);

    let calls = client.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 2);

    let chunked = calls.iter().find(|args| has_pair(args, "-file-path", &image)).unwrap();
    assert!(chunked.contains(&"-chunk".to_string()));

    let chunked_dir = calls.iter().find(|args| has_pair(args, "-zip-path", &image)).unwrap();
    assert!(chunked_dir.contains(&"-chunk".to_string()));

    // No plain unzipped upload
    assert!(!calls
        .iter()
        .any(|args| has_pair(args, "-zip-path", &image) && !args.contains(&"-chunk".to_string())));
    Ok(())
}

#[test]
fn test_overrides_leave_presets_untouched() {
    let presets = preset_artifacts();
    let overridden = override_artifacts(
        &presets,
        &["img=", "radio=./radio.img chunk", "new_logs=./logs/*.json"],
    );

    assert!(presets.contains_key("img"));
    assert!(!overridden.contains_key("img"));
    assert!(overridden["radio"].chunk);
    assert_eq!(overridden["new_logs"], ArtifactConfig::new("./logs/*.json", false));
    assert_eq!(overridden.keys().last().map(String::as_str), Some("new_logs"));
}

#[test]
fn test_experiments_are_resolved_after_presets() -> Result<()> {
    let dist_dir = TempDir::new()?;
    fs::write(dist_dir.path().join("oriole-proguard-dict-1.zip"), b"dict")?;

    let mut artifacts: Vec<ArtifactConfig> = preset_artifacts().into_values().collect();
    artifacts.extend(select_experiments(
        &experiment_artifacts(),
        &["device_image_proguard_dict", "unknown_experiment"],
    ));

    let uploads = TaskResolver::new(dist_dir.path()).resolve_uploads(&artifacts);
    let keys: Vec<&str> = uploads.iter().map(|u| u.target_key.as_str()).collect();
    assert!(keys.contains(&"oriole-proguard-dict-1.zip"));
    assert!(keys.contains(&"_chunked_oriole-proguard-dict-1.zip"));
    Ok(())
}

#[test]
fn test_preset_file_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("config/artifacts.yaml");

    save_presets(&preset_artifacts(), &path)?;
    let loaded = load_presets(&path)?;

    assert_eq!(loaded, preset_artifacts());
    Ok(())
}
