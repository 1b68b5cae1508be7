//! Local snapshot persistence
//!
//! Keeps a JSON snapshot of the application state on disk so the CLI has
//! data between runs and without a Drive connection. The remote document
//! remains the sync unit; this is a local convenience copy.

mod error;
mod persistence;

pub use error::{StorageError, StorageResult};
pub use persistence::SnapshotStore;
