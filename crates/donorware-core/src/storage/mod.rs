//! Storage layer for DonorWare.
//!
//! Provides the `StateStore` abstraction and its SQLite backend.

mod sqlite;
mod traits;

pub use sqlite::{SqliteStore, SCHEMA_VERSION};
pub use traits::StateStore;
