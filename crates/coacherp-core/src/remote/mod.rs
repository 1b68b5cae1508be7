//! Remote object store
//!
//! The sync engine talks to the user's cloud storage through the
//! `RemoteStore` trait: list files by name, fetch content, create a file,
//! overwrite its content. The production implementation is `DriveStore`
//! (Google Drive v3); tests substitute an in-memory store.

use std::future::Future;

use thiserror::Error;

use crate::auth::Grant;

mod drive;

pub use drive::DriveStore;

/// Errors from remote store operations
///
/// `Unauthorized` is special-cased by the sync engine: it forces a
/// disconnect instead of leaving the session to retry against a dead
/// credential.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The grant was rejected (expired or revoked)
    #[error("Authorization rejected by the remote store")]
    Unauthorized,

    /// The provider answered with a non-success status
    #[error("Remote store error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The provider could not be reached
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with something we could not decode
    #[error("Malformed response from remote store: {0}")]
    MalformedResponse(String),
}

/// A file entry as reported by the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
}

/// An opaque remote object store with list/get/create/update operations
///
/// All calls are asynchronous and may fail with transport errors or an
/// authorization error. Returned futures are `Send` so the engine can run
/// them from spawned tasks.
pub trait RemoteStore {
    /// List non-trashed files matching `name` exactly
    fn list(
        &self,
        grant: &Grant,
        name: &str,
    ) -> impl Future<Output = Result<Vec<RemoteFile>, RemoteError>> + Send;

    /// Fetch the full content of a file
    fn get(
        &self,
        grant: &Grant,
        id: &str,
    ) -> impl Future<Output = Result<String, RemoteError>> + Send;

    /// Create an empty file, returning its id
    fn create(
        &self,
        grant: &Grant,
        name: &str,
        mime_type: &str,
    ) -> impl Future<Output = Result<String, RemoteError>> + Send;

    /// Overwrite a file's content entirely
    fn update(
        &self,
        grant: &Grant,
        id: &str,
        content: &str,
        content_type: &str,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}

// Shared handles work wherever a store is expected
impl<T: RemoteStore + Send + Sync> RemoteStore for std::sync::Arc<T> {
    fn list(
        &self,
        grant: &Grant,
        name: &str,
    ) -> impl Future<Output = Result<Vec<RemoteFile>, RemoteError>> + Send {
        (**self).list(grant, name)
    }

    fn get(
        &self,
        grant: &Grant,
        id: &str,
    ) -> impl Future<Output = Result<String, RemoteError>> + Send {
        (**self).get(grant, id)
    }

    fn create(
        &self,
        grant: &Grant,
        name: &str,
        mime_type: &str,
    ) -> impl Future<Output = Result<String, RemoteError>> + Send {
        (**self).create(grant, name, mime_type)
    }

    fn update(
        &self,
        grant: &Grant,
        id: &str,
        content: &str,
        content_type: &str,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send {
        (**self).update(grant, id, content, content_type)
    }
}
