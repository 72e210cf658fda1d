//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error (used by anyhow for unhandled errors)
/// - 2: Misuse of shell command (reserved by clap)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// Item, user or store not found.
    pub const NOT_FOUND: i32 = 3;

    /// Invalid input, including an already registered username.
    pub const INVALID_INPUT: i32 = 4;

    /// Wrong username or password.
    pub const AUTH_FAILED: i32 = 5;

    /// Store contents violate a library invariant.
    pub const INTEGRITY_FAILED: i32 = 6;

    /// Item cannot be borrowed, or is not borrowed by the caller.
    pub const LENDING_REFUSED: i32 = 7;
}

/// Environment variables read by the CLI.
pub mod env_vars {
    pub const CONFIG: &str = "DONORWARE_CONFIG";
    pub const USER: &str = "DONORWARE_USER";
    pub const PASSWORD: &str = "DONORWARE_PASSWORD";
}

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "warn";
