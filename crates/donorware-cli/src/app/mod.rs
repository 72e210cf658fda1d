//! Application-level utilities for the DonorWare CLI.
//!
//! This module provides:
//! - The per-invocation context (config, store, UI settings)
//! - Path resolution for config and store files
//! - Login with retry

mod context;
mod resolver;
mod session;

pub use context::AppContext;
pub use resolver::resolve_config_path;
pub use session::login;
