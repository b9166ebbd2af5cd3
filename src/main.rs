use std::env;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger};

use content_uploader::cli::{Args, Commands};
use content_uploader::client::{detect_client_version, find_client, ProcessClient};
use content_uploader::config::{
    self, cas_endpoint, experiment_artifacts, load_or_default_presets, override_artifacts,
    preset_artifacts, save_presets, select_experiments, ArtifactConfig, ArtifactTable,
};
use content_uploader::constants::UPLOADER_VERSION;
use content_uploader::models::CasInfo;
use content_uploader::security::scrub_environment;
use content_uploader::uploader::{dry_run, random_max_workers, write_metrics, Uploader};

fn main() -> Result<()> {
    // Parse arguments
    let args = Args::parse();

    // Handle subcommands
    if let Some(cmd) = &args.command {
        initialize_logging(args.verbose, None)?;
        return handle_subcommand(cmd);
    }

    // --list and --dryrun write nothing to the output directory
    let dist_dir = config::dist_dir(args.dist_dir.as_deref());
    let log_file = args.log_file(dist_dir.as_deref().ok());
    initialize_logging(args.verbose, log_file.as_deref())?;

    info!("Content uploader version: {}", UPLOADER_VERSION);
    info!(
        "Environment variables of running server:\n{}",
        scrub_environment(
            env::vars_os().map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
        )
    );

    if let Err(e) = run(&args, dist_dir) {
        error!("Unexpected error: {:#}", e);
        return Err(e);
    }
    Ok(())
}

/// Initialize terminal logging, plus debug logging to `log_file` if given
fn initialize_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let term_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        term_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context(format!("Failed to create log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .context(format!("Failed to open log file {}", path.display()))?;
        println!("content_uploader will export logs to: {}", path.display());
        loggers.push(WriteLogger::new(LevelFilter::Debug, Config::default(), file));
    }

    CombinedLogger::init(loggers).context("Failed to initialize logger")?;
    Ok(())
}

/// Handle subcommands (init-config)
fn handle_subcommand(cmd: &Commands) -> Result<()> {
    match cmd {
        Commands::InitConfig { path } => {
            info!("Creating preset artifacts file at {}", path.display());
            save_presets(&preset_artifacts(), path)?;
            println!("Preset artifacts written to {}", path.display());
            Ok(())
        }
    }
}

fn run(args: &Args, dist_dir: Result<PathBuf>) -> Result<()> {
    // Resolve the artifacts to upload
    let artifacts = load_artifacts(args)?;
    let experiments = select_experiments(&experiment_artifacts(), &args.experiment_artifacts);

    if args.list {
        for (name, artifact) in &artifacts {
            println!("{:<30}={}", name, artifact);
        }
        return Ok(());
    }

    let dist_dir = dist_dir?;
    let all_artifacts: Vec<ArtifactConfig> = artifacts.into_values().chain(experiments).collect();

    if args.dryrun {
        dry_run(&all_artifacts, &dist_dir, &mut io::stdout().lock())?;
        return Ok(());
    }

    // Set up the CAS client
    let cas_info = init_cas_info()?;
    let max_workers = args.max_workers.unwrap_or_else(random_max_workers);

    let uploader = Uploader::new(cas_info.clone(), ProcessClient::new(&cas_info.client_path));
    let summary = uploader.upload_blocking(&all_artifacts, &dist_dir, max_workers)?;
    write_metrics(&summary.metrics, &dist_dir)?;

    println!(
        "Uploaded {} of {} files to {} in {} ms",
        summary.uploaded, summary.total_tasks, cas_info.cas_instance, summary.metrics.time_ms
    );
    Ok(())
}

/// Load presets and apply command-line overrides
fn load_artifacts(args: &Args) -> Result<ArtifactTable> {
    let presets = load_or_default_presets(args.config.as_deref())?;
    let artifacts = override_artifacts(&presets, &args.artifacts);
    for (name, artifact) in &artifacts {
        info!("Artifact {}: {}", name, artifact);
    }
    Ok(artifacts)
}

/// CAS endpoint from the environment and the client found from the
/// current directory
fn init_cas_info() -> Result<CasInfo> {
    let endpoint = cas_endpoint()?;
    let source_root = env::current_dir().context("Failed to get current directory")?;
    let client_path = find_client(&source_root)?;
    let client_version = detect_client_version(&client_path);

    Ok(CasInfo {
        cas_instance: endpoint.instance,
        cas_service: endpoint.service,
        client_path,
        client_version,
    })
}
