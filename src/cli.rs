use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::constants::LOG_PATH;

/// Command-line arguments for the content uploader.
///
/// Without a subcommand the tool uploads every preset artifact found in the
/// build output directory. `--artifacts` and `--experiment-artifacts` change
/// what is uploaded; `--list` and `--dryrun` only report.
#[derive(Parser, Debug)]
#[clap(
    name = "content_uploader",
    version,
    about = "Upload build artifacts to a content-addressable storage remote"
)]
pub struct Args {
    /// Override preset artifacts, e.g. --artifacts 'img=./*-img-*zip unzip chunk=false'.
    /// 'NAME=' removes a preset. Repeatable.
    #[clap(long = "artifacts", value_name = "NAME=PATH [ATTR[=BOOL]]...")]
    pub artifacts: Vec<String>,

    /// Name of an experiment artifact config to upload as well. Repeatable.
    #[clap(long, alias = "experiment_artifacts", value_name = "NAME")]
    pub experiment_artifacts: Vec<String>,

    /// List the artifact configs and exit
    #[clap(long)]
    pub list: bool,

    /// List the files to upload and exit
    #[clap(long)]
    pub dryrun: bool,

    /// YAML file replacing the compiled-in preset artifacts
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Build output directory (default: $DIST_DIR)
    #[clap(long)]
    pub dist_dir: Option<PathBuf>,

    /// Number of concurrent uploads (default: random between 2 and 6)
    #[clap(long, value_parser = parse_worker_count)]
    pub max_workers: Option<usize>,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands
    #[clap(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write the compiled-in preset artifacts as a YAML file
    InitConfig {
        /// Path to output configuration file
        #[clap(default_value = "artifacts.yaml")]
        path: PathBuf,
    },
}

impl Args {
    /// Whether this run only prints a report
    pub fn is_report_only(&self) -> bool {
        self.list || self.dryrun
    }

    /// File log under `dist_dir`, or None when the run must leave the
    /// output directory untouched
    pub fn log_file(&self, dist_dir: Option<&Path>) -> Option<PathBuf> {
        if self.is_report_only() {
            return None;
        }
        dist_dir.map(|dir| dir.join(LOG_PATH))
    }
}

fn parse_worker_count(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(count) => Ok(count),
        Err(e) => Err(e.to_string()),
    }
}
