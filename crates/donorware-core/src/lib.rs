//! # DonorWare Core
//!
//! Core library for DonorWare - a community inventory of donated literary
//! items with borrowing and due-date tracking.
//!
//! This crate provides the domain model, the lending rules, and the
//! persisted state store independent of the CLI interface.
//!
//! ## Architecture
//!
//! - **catalog**: Item records, item types and their attributes
//! - **registry**: User accounts, credentials and transaction history
//! - **lending**: Active loans, closed loans and the lending policy
//! - **search**: Linear attribute filtering over the catalog
//! - **library**: Facade that keeps the catalog, registry and ledger consistent
//! - **storage**: Wholesale load/save of a library (SQLite)

pub mod catalog;
pub mod error;
pub mod fs;
pub mod lending;
pub mod library;
pub mod registry;
pub mod search;
pub mod storage;

pub use catalog::{Availability, Item, ItemDetails, ItemId, ItemKind, NewItem};
pub use error::{DonorError, Result};
pub use lending::{ClosedLoan, LendingPolicy, Loan};
pub use library::{Library, LibraryState};
pub use registry::{Transaction, TransactionKind, User};
pub use search::{Predicate, Search, SearchFilter};
pub use storage::{SqliteStore, StateStore};

/// Core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
