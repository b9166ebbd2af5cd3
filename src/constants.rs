//! Global constants for the content uploader.
//!
//! This module centralizes all hardcoded values: output locations inside the
//! build output directory, limits applied to the external CAS client, and the
//! names of the environment variables the tool reads.

/// Version of this uploader, reported in metrics and logs
pub const UPLOADER_VERSION: &str = "1.2";

// CAS client invocation
/// Timeout applied to every CAS client invocation (10 minutes)
pub const UPLOADER_TIMEOUT_SECS: u64 = 600;

/// Average chunk size passed to the client for chunked uploads
pub const AVG_CHUNK_SIZE_IN_KB: u32 = 128;

/// Minimum client version supporting `-dump-file-details`
pub const FILE_DETAILS_MIN_VERSION: (u32, u32) = (1, 0);

/// Minimum client version supporting `-dump-metrics`
pub const METRICS_MIN_VERSION: (u32, u32) = (1, 3);

/// Name of the CAS uploader binary
pub const CAS_UPLOADER_BIN: &str = "casuploader";

/// Location of the client built from source, relative to the source root
pub const CAS_UPLOADER_PATH: &str = "tools/content_addressed_storage/prebuilts/";

/// Location of the prebuilt clients, searched recursively
pub const CAS_UPLOADER_PREBUILT_PATH: &str = "tools/tradefederation/prebuilts/";

// Outputs, relative to the build output directory
/// Digest manifest
pub const DIGESTS_PATH: &str = "cas_digests.json";

/// Per-file details of every uploaded artifact
pub const CONTENT_DETAILS_PATH: &str = "logs/cas_content_details.json";

/// Log file of the uploader and the client output
pub const LOG_PATH: &str = "logs/cas_uploader.log";

/// Aggregated upload metrics
pub const CAS_METRICS_PATH: &str = "logs/cas_metrics.json";

// Manifest keys
/// Key prefix of chunked single-file uploads
pub const CHUNKED_ARTIFACT_NAME_PREFIX: &str = "_chunked_";

/// Key prefix of chunked directory uploads
pub const CHUNKED_DIR_ARTIFACT_NAME_PREFIX: &str = "_chunked_dir_";

// Worker pool
/// Lower bound of the randomized worker count
pub const MAX_WORKERS_LOWER_BOUND: usize = 2;

/// Upper bound of the randomized worker count
pub const MAX_WORKERS_UPPER_BOUND: usize = 6;

// Environment
/// Build output directory
pub const ENV_DIST_DIR: &str = "DIST_DIR";

/// CAS instance name
pub const ENV_CAS_INSTANCE: &str = "RBE_instance";

/// CAS service address
pub const ENV_CAS_SERVICE: &str = "RBE_service";

/// Explicit location of the CAS client binary
pub const ENV_CLIENT_PATH: &str = "CAS_UPLOADER_PATH";
