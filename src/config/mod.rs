// Re-export all items from the submodules
mod artifact_config;
mod artifact_manager;
mod default_configs;
mod env_vars;
mod preset_file;

// Re-export artifact configs
pub use artifact_config::{ArtifactConfig, Variation};

// Re-export override handling
pub use artifact_manager::{
    ArtifactManager,
    OverrideOutcome,
    override_artifacts,
    select_experiments,
};

// Re-export preset tables
pub use default_configs::{
    ArtifactTable,
    experiment_artifacts,
    preset_artifacts,
};

// Re-export preset files
pub use preset_file::{
    load_or_default_presets,
    load_presets,
    save_presets,
};

// Re-export environment variable functions
pub use env_vars::{
    CasEndpoint,
    cas_endpoint,
    cas_endpoint_from,
    dist_dir,
    dist_dir_from,
    get_env_var,
};
