//! Error types for DonorWare core operations.
//!
//! Every operation on the library reports one of these kinds. The CLI layer
//! renders them as user-facing messages; only storage failures end a session.

use thiserror::Error;

/// Result type alias for DonorWare operations.
pub type Result<T> = std::result::Result<T, DonorError>;

/// Core error type for DonorWare operations.
#[derive(Debug, Error)]
pub enum DonorError {
    /// Bad or missing item attributes, usernames or other input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Username is already registered
    #[error("User \"{0}\" already exists")]
    DuplicateUser(String),

    /// Username/password mismatch
    #[error("Invalid username or password")]
    Auth,

    /// Item, user or store not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Item cannot be borrowed right now
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// No active loan matches a return request
    #[error("Not borrowed: {0}")]
    NotBorrowed(String),

    /// Persisted state violates a library invariant
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),
}

impl DonorError {
    /// Whether this error should abort the current session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DonorError::Storage(_) | DonorError::Integrity(_))
    }
}

impl From<std::io::Error> for DonorError {
    fn from(err: std::io::Error) -> Self {
        DonorError::Storage(err.to_string())
    }
}

impl From<rusqlite::Error> for DonorError {
    fn from(err: rusqlite::Error) -> Self {
        DonorError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DonorError {
    fn from(err: serde_json::Error) -> Self {
        DonorError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_and_integrity_errors_are_fatal() {
        assert!(DonorError::Storage("disk".to_string()).is_fatal());
        assert!(DonorError::Integrity("loan".to_string()).is_fatal());
        assert!(!DonorError::Auth.is_fatal());
        assert!(!DonorError::Unavailable("x".to_string()).is_fatal());
    }

    #[test]
    fn test_duplicate_user_message_names_user() {
        let err = DonorError::DuplicateUser("alice".to_string());
        assert_eq!(err.to_string(), "User \"alice\" already exists");
    }
}
