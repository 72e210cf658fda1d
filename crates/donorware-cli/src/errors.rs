//! CLI error types and exit code mapping.
//!
//! Handlers return `anyhow::Result`; at the top level the error chain is
//! inspected for a `CliError` or a core `DonorError` to pick an exit code
//! and a hint.

use std::fmt;

use donorware_core::DonorError;

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Store or config not found
    NotFound { message: String, hint: String },

    /// Credentials could not be obtained or were rejected
    AuthFailed {
        message: String,
        hint: Option<String>,
    },

    /// Invalid user input
    InvalidInput(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, .. } => write!(f, "{}", message),
            CliError::AuthFailed { message, .. } => write!(f, "{}", message),
            CliError::InvalidInput(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    pub fn auth_failed_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::AuthFailed {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::AuthFailed { .. } => exit_codes::AUTH_FAILED,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
        }
    }

    pub fn hint(&self) -> Option<&str> {
        match self {
            CliError::NotFound { hint, .. } => Some(hint),
            CliError::AuthFailed { hint, .. } => hint.as_deref(),
            CliError::InvalidInput(_) => None,
        }
    }
}

/// Exit code for a core error.
pub fn donor_exit_code(err: &DonorError) -> i32 {
    match err {
        DonorError::NotFound(_) => exit_codes::NOT_FOUND,
        DonorError::Validation(_) | DonorError::DuplicateUser(_) => exit_codes::INVALID_INPUT,
        DonorError::Auth => exit_codes::AUTH_FAILED,
        DonorError::Integrity(_) => exit_codes::INTEGRITY_FAILED,
        DonorError::Unavailable(_) | DonorError::NotBorrowed(_) => exit_codes::LENDING_REFUSED,
        DonorError::Storage(_) => 1,
    }
}

/// Follow-up suggestion for a core error.
pub fn donor_hint(err: &DonorError) -> Option<&'static str> {
    match err {
        DonorError::NotFound(what) if what.starts_with("item") => {
            Some("Run `donorware search` to find item IDs.")
        }
        DonorError::NotFound(_) => Some("Run `donorware register` to create an account."),
        DonorError::DuplicateUser(_) => Some("Pick another username, or log in instead."),
        DonorError::Auth => Some("Check --user and DONORWARE_PASSWORD."),
        DonorError::Unavailable(_) => Some("Run `donorware search --available` to see what is on the shelf."),
        DonorError::NotBorrowed(_) => Some("Run `donorware inventory borrowed` to see your loans."),
        DonorError::Integrity(_) => Some("Restore the store from a backup before retrying."),
        DonorError::Validation(_) | DonorError::Storage(_) => None,
    }
}

/// Exit code for any error reaching `main`.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if let Some(cli) = cause.downcast_ref::<CliError>() {
            return cli.exit_code();
        }
        if let Some(core) = cause.downcast_ref::<DonorError>() {
            return donor_exit_code(core);
        }
    }
    1
}

/// Hint for any error reaching `main`.
pub fn hint(err: &anyhow::Error) -> Option<String> {
    for cause in err.chain() {
        if let Some(cli) = cause.downcast_ref::<CliError>() {
            return cli.hint().map(str::to_string);
        }
        if let Some(core) = cause.downcast_ref::<DonorError>() {
            return donor_hint(core).map(str::to_string);
        }
    }
    None
}

/// Whether an error ends an interactive session.
///
/// Only input, credential and lending errors are recoverable; anything
/// else (storage, integrity, terminal I/O) is fatal.
pub fn is_fatal(err: &anyhow::Error) -> bool {
    for cause in err.chain() {
        if cause.downcast_ref::<CliError>().is_some() {
            return false;
        }
        if let Some(core) = cause.downcast_ref::<DonorError>() {
            return core.is_fatal();
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_exit_codes() {
        let cases = [
            (DonorError::NotFound("item 9".into()), exit_codes::NOT_FOUND),
            (DonorError::Validation("x".into()), exit_codes::INVALID_INPUT),
            (DonorError::DuplicateUser("alice".into()), exit_codes::INVALID_INPUT),
            (DonorError::Auth, exit_codes::AUTH_FAILED),
            (DonorError::Integrity("x".into()), exit_codes::INTEGRITY_FAILED),
            (DonorError::Unavailable("x".into()), exit_codes::LENDING_REFUSED),
            (DonorError::NotBorrowed("x".into()), exit_codes::LENDING_REFUSED),
        ];
        for (err, code) in cases {
            assert_eq!(exit_code(&anyhow::Error::new(err)), code);
        }
    }

    #[test]
    fn test_context_does_not_hide_exit_code() {
        let err = anyhow::Error::new(DonorError::Auth).context("Login failed");
        assert_eq!(exit_code(&err), exit_codes::AUTH_FAILED);
        assert!(!is_fatal(&err));
    }

    #[test]
    fn test_cli_error_hint_and_code() {
        let err = anyhow::Error::new(CliError::not_found("No store", "Run `donorware init`"));
        assert_eq!(exit_code(&err), exit_codes::NOT_FOUND);
        assert_eq!(hint(&err).as_deref(), Some("Run `donorware init`"));
    }

    #[test]
    fn test_storage_and_unknown_errors_are_fatal() {
        assert!(is_fatal(&anyhow::Error::new(DonorError::Storage("disk".into()))));
        assert!(is_fatal(&anyhow::anyhow!("terminal closed")));
        assert!(!is_fatal(&anyhow::Error::new(DonorError::Unavailable("x".into()))));
    }

    #[test]
    fn test_item_not_found_hint_mentions_search() {
        let hint = donor_hint(&DonorError::NotFound("item 4".into())).unwrap();
        assert!(hint.contains("search"));
    }
}
