//! Path resolution for config and store files.

use std::path::{Path, PathBuf};

use crate::config::{default_config_path, default_store_path, DonorConfig};
use crate::constants::env_vars;

/// Resolve the config file path, checking DONORWARE_CONFIG first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var(env_vars::CONFIG) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Resolve the store path: `--store` (or DONORWARE_STORE), then the config
/// file, then the XDG data directory.
pub fn resolve_store_path(flag: Option<&str>, config: &DonorConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = flag.filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }
    if let Some(path) = config.store.path.as_deref().filter(|p| !p.trim().is_empty()) {
        return Ok(PathBuf::from(path));
    }
    default_store_path()
}

/// Error message when the store file is missing.
pub fn missing_store_message(path: &Path) -> String {
    format!("No DonorWare store found at {}", path.display())
}
