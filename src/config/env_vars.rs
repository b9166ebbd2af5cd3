use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::constants::{ENV_CAS_INSTANCE, ENV_CAS_SERVICE, ENV_DIST_DIR};

/// CAS endpoint supplied by the build environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasEndpoint {
    pub instance: String,
    pub service: String,
}

/// Read an environment variable, treating an empty value as unset
pub fn get_env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("Error: the environment variable {} is not set", key))
}

/// CAS endpoint from `RBE_instance` and `RBE_service`
pub fn cas_endpoint() -> Result<CasEndpoint> {
    cas_endpoint_from(get_env_var)
}

/// CAS endpoint using a custom variable lookup
pub fn cas_endpoint_from<F>(lookup: F) -> Result<CasEndpoint>
where
    F: Fn(&str) -> Option<String>,
{
    Ok(CasEndpoint {
        instance: require(&lookup, ENV_CAS_INSTANCE)?,
        service: require(&lookup, ENV_CAS_SERVICE)?,
    })
}

/// Build output directory: the explicit path if given, otherwise `DIST_DIR`
pub fn dist_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    dist_dir_from(explicit, get_env_var)
}

pub fn dist_dir_from<F>(explicit: Option<&Path>, lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => require(&lookup, ENV_DIST_DIR).map(PathBuf::from),
    }
}
