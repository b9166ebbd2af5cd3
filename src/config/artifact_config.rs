use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{CHUNKED_ARTIFACT_NAME_PREFIX, CHUNKED_DIR_ARTIFACT_NAME_PREFIX};

/// Configuration of one class of artifact to upload to CAS.
///
/// `source_path` is a glob pattern relative to the build output directory.
/// A pattern starting with `./` only matches at that exact location; any other
/// pattern matches at every depth. Once a config is resolved into an upload
/// task, `source_path` holds the concrete file path instead.
///
/// The three upload modes are independent: each one that is set produces its
/// own upload of every matched file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ArtifactConfig {
    pub source_path: String,
    /// Upload the file as an unzipped directory (standard mode only)
    #[serde(default)]
    pub unzip: bool,
    /// Regular, non-chunked upload
    #[serde(default = "default_standard")]
    pub standard: bool,
    /// Chunked upload of the file as a single blob
    #[serde(default)]
    pub chunk: bool,
    /// Chunked upload of the unzipped content
    #[serde(default)]
    pub chunk_dir: bool,
    /// Regular expressions of files excluded from the upload
    #[serde(default)]
    pub exclude_filters: Vec<String>,
}

fn default_standard() -> bool {
    true
}

impl ArtifactConfig {
    /// Create a config with only the standard upload mode enabled
    pub fn new(source_path: impl Into<String>, unzip: bool) -> Self {
        Self {
            source_path: source_path.into(),
            unzip,
            standard: true,
            chunk: false,
            chunk_dir: false,
            exclude_filters: Vec::new(),
        }
    }

    pub fn with_chunk(mut self, chunk: bool) -> Self {
        self.chunk = chunk;
        self
    }

    pub fn with_chunk_dir(mut self, chunk_dir: bool) -> Self {
        self.chunk_dir = chunk_dir;
        self
    }

    pub fn with_standard(mut self, standard: bool) -> Self {
        self.standard = standard;
        self
    }

    pub fn with_exclude_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_filters = filters.into_iter().map(Into::into).collect();
        self
    }

    /// Whether at least one upload mode is enabled
    pub fn is_uploadable(&self) -> bool {
        self.standard || self.chunk || self.chunk_dir
    }

    /// Upload variations requested by this config, in standard, chunk,
    /// chunk_dir order.
    pub fn variations(&self) -> Vec<Variation> {
        let mut variations = Vec::with_capacity(3);
        if self.standard {
            variations.push(Variation::Standard { unzip: self.unzip });
        }
        if self.chunk {
            variations.push(Variation::Chunk);
        }
        if self.chunk_dir {
            variations.push(Variation::ChunkDir);
        }
        variations
    }

    /// The single variation this config describes once resolved into a task.
    ///
    /// Flags are checked in standard, chunk, chunk_dir order. A config with
    /// no mode set maps to [`Variation::Directory`].
    pub fn variation(&self) -> Variation {
        if self.standard {
            Variation::Standard { unzip: self.unzip }
        } else if self.chunk {
            Variation::Chunk
        } else if self.chunk_dir {
            Variation::ChunkDir
        } else {
            Variation::Directory
        }
    }
}

impl fmt::Display for ArtifactConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (unzip={}, standard={}, chunk={}, chunk_dir={}",
            self.source_path, self.unzip, self.standard, self.chunk, self.chunk_dir
        )?;
        if !self.exclude_filters.is_empty() {
            write!(f, ", exclude_filters={:?}", self.exclude_filters)?;
        }
        write!(f, ")")
    }
}

/// One upload representation of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variation {
    /// Non-chunked upload, as a zip directory when `unzip` is set
    Standard { unzip: bool },
    /// Chunked upload of the file itself
    Chunk,
    /// Chunked upload of the unzipped directory
    ChunkDir,
    /// No mode set: the file is copied into a scratch directory which is
    /// uploaded as a plain directory
    Directory,
}

impl Variation {
    /// Prefix of the manifest key for this variation
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Variation::Chunk => CHUNKED_ARTIFACT_NAME_PREFIX,
            Variation::ChunkDir => CHUNKED_DIR_ARTIFACT_NAME_PREFIX,
            Variation::Standard { .. } | Variation::Directory => "",
        }
    }

    /// Manifest key of `relative_path` uploaded with this variation
    pub fn target_key(&self, relative_path: &str) -> String {
        format!("{}{}", self.key_prefix(), relative_path)
    }

    pub fn is_chunked(&self) -> bool {
        matches!(self, Variation::Chunk | Variation::ChunkDir)
    }

    pub fn unzip(&self) -> bool {
        match self {
            Variation::Standard { unzip } => *unzip,
            Variation::ChunkDir => true,
            Variation::Chunk | Variation::Directory => false,
        }
    }

    /// Single-variation config carrying the given source path and filters.
    pub fn to_config(&self, source_path: impl Into<String>, exclude_filters: &[String]) -> ArtifactConfig {
        let (standard, chunk, chunk_dir) = match self {
            Variation::Standard { .. } => (true, false, false),
            Variation::Chunk => (false, true, false),
            Variation::ChunkDir => (false, false, true),
            Variation::Directory => (false, false, false),
        };
        ArtifactConfig {
            source_path: source_path.into(),
            unzip: self.unzip(),
            standard,
            chunk,
            chunk_dir,
            exclude_filters: exclude_filters.to_vec(),
        }
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variation::Standard { unzip: true } => write!(f, "standard (unzip)"),
            Variation::Standard { unzip: false } => write!(f, "standard"),
            Variation::Chunk => write!(f, "chunk"),
            Variation::ChunkDir => write!(f, "chunk_dir"),
            Variation::Directory => write!(f, "directory"),
        }
    }
}
