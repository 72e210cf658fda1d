//! State store trait definition.
//!
//! A `StateStore` persists a whole [`LibraryState`] at a time. The library
//! is loaded once at startup and saved wholesale after each mutating
//! command, so backends never see individual operations.

use crate::error::Result;
use crate::library::LibraryState;

/// Wholesale persistence for a library snapshot.
///
/// All implementations must ensure:
/// - `save` either replaces the previous snapshot completely or leaves it
///   untouched (file-backed stores on platforms without an atomic replacing
///   rename may lose the previous file if the final rename fails)
/// - `load` returns exactly what the last successful `save` wrote
pub trait StateStore {
    /// Whether a store already exists at this location.
    fn exists(&self) -> bool;

    /// Create an empty store.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::Storage` if a store already exists or the
    /// location is not writable.
    fn create(&self) -> Result<()>;

    /// Load the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::Storage` if the store is missing, unreadable or
    /// written by an unknown schema version.
    fn load(&self) -> Result<LibraryState>;

    /// Replace the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns `DonorError::Storage` if the snapshot cannot be written.
    fn save(&self, state: &LibraryState) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_is_object_safe() {
        fn _accepts_boxed_store(_store: Box<dyn StateStore>) {}
    }
}
