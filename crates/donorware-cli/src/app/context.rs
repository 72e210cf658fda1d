//! Application context for the DonorWare CLI.
//!
//! Combines CLI arguments with the lazily-loaded config file.

use std::io::IsTerminal;
use std::path::PathBuf;

use once_cell::unsync::OnceCell;
use tracing::debug;

use donorware_core::{LendingPolicy, Library, SqliteStore, StateStore};

use crate::cli::Cli;
use crate::config::{read_config, DonorConfig};
use crate::errors::CliError;
use crate::ui::UiContext;

use super::resolver::{missing_store_message, resolve_config_path, resolve_store_path};

/// Application context that bundles CLI args with configuration.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<DonorConfig>,
}

impl<'a> AppContext<'a> {
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    pub fn cli(&self) -> &Cli {
        self.cli
    }

    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Whether prompts may be shown (stdin is a TTY).
    pub fn interactive(&self) -> bool {
        std::io::stdin().is_terminal()
    }

    /// Get the config file contents, loading them lazily. A missing file
    /// yields the defaults.
    pub fn config(&self) -> anyhow::Result<&DonorConfig> {
        self.config.get_or_try_init(|| {
            let path = resolve_config_path()?;
            if !path.exists() {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(DonorConfig::default());
            }
            debug!(path = %path.display(), "reading config");
            read_config(&path)
        })
    }

    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        resolve_store_path(self.cli.store.as_deref(), self.config()?)
    }

    pub fn store(&self) -> anyhow::Result<SqliteStore> {
        Ok(SqliteStore::new(self.store_path()?))
    }

    pub fn policy(&self) -> anyhow::Result<LendingPolicy> {
        Ok(self.config()?.lending_policy())
    }

    /// UI settings from flags and the config `[ui]` section.
    ///
    /// Never fails: an unreadable config falls back to the flags alone so
    /// that errors can still be rendered.
    pub fn ui_context(&self) -> UiContext {
        let ui = self.config().map(|c| c.ui.clone()).unwrap_or_default();
        let no_color = self.cli.no_color || ui.color == Some(false);
        let ascii = self.cli.ascii || ui.ascii;
        UiContext::from_env(self.cli.json, no_color, ascii)
    }

    /// Load the library from the resolved store.
    pub fn load_library(&self) -> anyhow::Result<Library> {
        let store = self.store()?;
        if !store.exists() {
            return Err(CliError::not_found(
                missing_store_message(store.path()),
                "Run `donorware init` to create one.",
            )
            .into());
        }
        let state = store.load()?;
        Ok(Library::from_state(state, self.policy()?)?)
    }

    /// Persist the library to the resolved store.
    pub fn save_library(&self, library: &Library) -> anyhow::Result<()> {
        self.store()?.save(&library.to_state())?;
        Ok(())
    }
}
