use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use donorware_core::lending::DEFAULT_LOAN_PERIOD_DAYS;
use donorware_core::LendingPolicy;

/// Contents of `config.toml`. Every section is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DonorConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub lending: LendingSection,
    #[serde(default)]
    pub ui: UiSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LendingSection {
    pub loan_period_days: u32,
    pub allow_self_borrow: bool,
}

impl Default for LendingSection {
    fn default() -> Self {
        Self {
            loan_period_days: DEFAULT_LOAN_PERIOD_DAYS,
            allow_self_borrow: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UiSection {
    /// `false` disables colors even on a TTY
    pub color: Option<bool>,
    #[serde(default)]
    pub ascii: bool,
}

impl DonorConfig {
    pub fn new(store_path: &Path, lending: LendingSection) -> Self {
        Self {
            store: StoreSection {
                path: Some(store_path.to_string_lossy().to_string()),
            },
            lending,
            ui: UiSection::default(),
        }
    }

    pub fn lending_policy(&self) -> LendingPolicy {
        LendingPolicy::default()
            .with_loan_period_days(self.lending.loan_period_days)
            .with_self_borrow(self.lending.allow_self_borrow)
    }
}

pub fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_config_dir()?.join("config.toml"))
}

pub fn default_store_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("donorware.db"))
}

pub fn read_config(path: &Path) -> anyhow::Result<DonorConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
    toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), e))
}

pub fn write_config(path: &Path, config: &DonorConfig) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create config directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    let contents =
        toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {}", e))?;
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("Failed to write config {}: {}", path.display(), e))?;
    Ok(())
}

pub fn xdg_config_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_CONFIG_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("donorware"));
        }
    }
    Ok(home_dir()?.join(".config").join("donorware"))
}

pub fn xdg_data_dir() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("XDG_DATA_HOME") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value).join("donorware"));
        }
    }
    Ok(home_dir()?.join(".local").join("share").join("donorware"))
}

fn home_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .map_err(|_| anyhow::anyhow!("HOME is not set; cannot resolve default paths"))?;
    Ok(PathBuf::from(home))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: DonorConfig = toml::from_str("").unwrap();
        assert_eq!(config, DonorConfig::default());
        assert_eq!(config.lending.loan_period_days, DEFAULT_LOAN_PERIOD_DAYS);
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_partial_lending_section() {
        let config: DonorConfig = toml::from_str("[lending]\nallow_self_borrow = true\n").unwrap();
        let policy = config.lending_policy();
        assert!(policy.allow_self_borrow);
        assert_eq!(policy.loan_period_days, DEFAULT_LOAN_PERIOD_DAYS);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("donorware").join("config.toml");
        let config = DonorConfig::new(
            Path::new("/srv/donorware.db"),
            LendingSection {
                loan_period_days: 7,
                allow_self_borrow: false,
            },
        );

        write_config(&path, &config).unwrap();
        let read = read_config(&path).unwrap();
        assert_eq!(read, config);
        assert_eq!(read.lending_policy().loan_period_days, 7);
    }

    #[test]
    fn test_bad_toml_names_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[lending\n").unwrap();
        let err = read_config(&path).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }
}
