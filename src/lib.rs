//! # content_uploader
//!
//! Uploads build output artifacts to a content-addressable storage (CAS)
//! remote through the external `casuploader` client.
//!
//! ## Overview
//!
//! A run takes a declarative table of artifact patterns, resolves them
//! against the build output directory, uploads every matched file with
//! repeated, concurrent client invocations and writes a manifest mapping
//! each uploaded file to its CAS digest. A failed upload only removes its
//! entry from the manifest; it never aborts the run.
//!
//! ## Usage
//!
//! ```no_run
//! use content_uploader::client::{detect_client_version, find_client, ProcessClient};
//! use content_uploader::config::{cas_endpoint, preset_artifacts};
//! use content_uploader::models::CasInfo;
//! use content_uploader::uploader::Uploader;
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let endpoint = cas_endpoint()?;
//! let client_path = find_client(Path::new("."))?;
//! let cas_info = CasInfo {
//!     cas_instance: endpoint.instance,
//!     cas_service: endpoint.service,
//!     client_version: detect_client_version(&client_path),
//!     client_path: client_path.clone(),
//! };
//!
//! let artifacts: Vec<_> = preset_artifacts().into_values().collect();
//! let uploader = Uploader::new(cas_info, ProcessClient::new(client_path));
//! let summary = uploader.upload_blocking(&artifacts, Path::new("/out/dist"), 4)?;
//!
//! println!("Uploaded {} of {} files", summary.uploaded, summary.total_tasks);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions and argument parsing
//! - [`models`]: Core data models and structures
//! - [`config`]: Artifact configs, presets, overrides and environment
//! - [`client`]: The external CAS client and its command line
//! - [`uploader`]: Task resolution, concurrent upload and result aggregation
//! - [`security`]: Credential scrubbing for logged text
//! - [`constants`]: Application-wide constants

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Core data models and structures used throughout the application
pub mod models;

/// Artifact configs, preset tables, overrides and environment discovery
pub mod config;

/// Access to the external CAS uploader binary
pub mod client;

/// Upload orchestration
pub mod uploader;

/// Application constants and configuration values
pub mod constants;

/// Security utilities for credential protection
pub mod security;

/// Test utilities and helpers
#[cfg(test)]
pub mod test_utils;
