//! Remote document locator
//!
//! Resolves the well-known document name to a remote file id, creating the
//! file on first use. The resolved id is cached so repeat syncs skip the
//! lookup; a disconnect forgets it.

use tracing::{debug, info};

use crate::auth::Grant;
use crate::remote::{RemoteError, RemoteStore};

const DOCUMENT_MIME: &str = "application/json";

/// Resolves and caches the remote document id
///
/// If two clients run `locate` concurrently against an empty account, both
/// may create a file. Accepted for a single-admin tool; the first listed
/// file wins on subsequent lookups.
#[derive(Debug)]
pub struct DocumentLocator {
    file_name: String,
    cached: Option<String>,
}

impl DocumentLocator {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            cached: None,
        }
    }

    /// The document name being located
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The cached id, if a lookup already succeeded
    pub fn cached(&self) -> Option<&str> {
        self.cached.as_deref()
    }

    /// Drop the cached id (on disconnect)
    pub fn forget(&mut self) {
        self.cached = None;
    }

    /// Resolve the document id
    ///
    /// Returns the cached id without network access when present.
    /// Otherwise lists non-trashed files by name and takes the first
    /// match, or creates a new empty file. The result is cached.
    pub async fn locate<R: RemoteStore>(
        &mut self,
        remote: &R,
        grant: &Grant,
    ) -> Result<String, RemoteError> {
        if let Some(id) = &self.cached {
            debug!(file_id = %id, "Using cached document id");
            return Ok(id.clone());
        }

        let matches = remote.list(grant, &self.file_name).await?;
        let id = match matches.into_iter().next() {
            Some(file) => {
                debug!(file_id = %file.id, "Found existing remote document");
                file.id
            }
            None => {
                let id = remote.create(grant, &self.file_name, DOCUMENT_MIME).await?;
                info!(file_id = %id, name = %self.file_name, "Created remote document");
                id
            }
        };

        self.cached = Some(id.clone());
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testing::MemoryRemote;

    fn grant() -> Grant {
        Grant::new("test-token")
    }

    #[tokio::test]
    async fn test_finds_existing_document() {
        let remote = MemoryRemote::new();
        let id = remote.seed_file("CoachERP_data.json", "{}");

        let mut locator = DocumentLocator::new("CoachERP_data.json");
        let located = locator.locate(&remote, &grant()).await.unwrap();

        assert_eq!(located, id);
        assert_eq!(locator.cached(), Some(id.as_str()));
        assert_eq!(remote.create_count(), 0);
    }

    #[tokio::test]
    async fn test_creates_document_when_absent() {
        let remote = MemoryRemote::new();

        let mut locator = DocumentLocator::new("CoachERP_data.json");
        let id = locator.locate(&remote, &grant()).await.unwrap();

        assert_eq!(remote.create_count(), 1);
        assert_eq!(remote.file_name(&id).unwrap(), "CoachERP_data.json");
        // The new file starts empty
        assert_eq!(remote.content(&id).unwrap(), "");
    }

    #[tokio::test]
    async fn test_cached_id_skips_network() {
        let remote = MemoryRemote::new();
        remote.seed_file("CoachERP_data.json", "{}");

        let mut locator = DocumentLocator::new("CoachERP_data.json");
        let first = locator.locate(&remote, &grant()).await.unwrap();
        let calls_after_first = remote.call_count();

        let second = locator.locate(&remote, &grant()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(remote.call_count(), calls_after_first);
    }

    #[tokio::test]
    async fn test_repeat_locate_does_not_duplicate() {
        let remote = MemoryRemote::new();

        let mut locator = DocumentLocator::new("CoachERP_data.json");
        locator.locate(&remote, &grant()).await.unwrap();
        locator.locate(&remote, &grant()).await.unwrap();

        assert_eq!(remote.create_count(), 1);
    }

    #[tokio::test]
    async fn test_forget_clears_cache() {
        let remote = MemoryRemote::new();
        remote.seed_file("CoachERP_data.json", "{}");

        let mut locator = DocumentLocator::new("CoachERP_data.json");
        locator.locate(&remote, &grant()).await.unwrap();
        assert!(locator.cached().is_some());

        locator.forget();
        assert!(locator.cached().is_none());
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let remote = MemoryRemote::new();
        let first = remote.seed_file("CoachERP_data.json", "a");
        let _second = remote.seed_file("CoachERP_data.json", "b");

        let mut locator = DocumentLocator::new("CoachERP_data.json");
        let located = locator.locate(&remote, &grant()).await.unwrap();
        assert_eq!(located, first);
    }
}
