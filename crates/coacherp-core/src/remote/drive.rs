//! Google Drive v3 remote store
//!
//! Implements `RemoteStore` against the Drive REST API with a bearer
//! token. Only the four operations the sync engine needs are covered:
//! query-by-name, media download, metadata create, and media overwrite.

use serde::Deserialize;
use tracing::debug;

use crate::auth::Grant;
use crate::remote::{RemoteError, RemoteFile, RemoteStore};

const API_BASE: &str = "https://www.googleapis.com";

/// Google Drive v3 client
#[derive(Debug, Clone)]
pub struct DriveStore {
    http: reqwest::Client,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFileEntry>,
}

#[derive(Debug, Deserialize)]
struct DriveFileEntry {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct DriveCreated {
    id: String,
}

impl DriveStore {
    /// Create a client against the production Drive endpoint
    pub fn new() -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("coacherp/1.0")
            .build()?;
        Ok(Self {
            http,
            api_base: API_BASE.to_string(),
        })
    }

    /// Point the client at a different base URL (testing)
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Map a non-success response to a `RemoteError`
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.as_u16() == 401 {
            return Err(RemoteError::Unauthorized);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

impl RemoteStore for DriveStore {
    async fn list(&self, grant: &Grant, name: &str) -> Result<Vec<RemoteFile>, RemoteError> {
        debug!(name, "Listing remote files");
        let query = format!("name='{}' and trashed=false", name.replace('\'', "\\'"));
        let response = self
            .http
            .get(format!("{}/drive/v3/files", self.api_base))
            .bearer_auth(grant.access_token())
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id, name)"),
                ("spaces", "drive"),
            ])
            .send()
            .await?;

        let listing: DriveFileList = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;

        Ok(listing
            .files
            .into_iter()
            .map(|f| RemoteFile {
                id: f.id,
                name: f.name,
            })
            .collect())
    }

    async fn get(&self, grant: &Grant, id: &str) -> Result<String, RemoteError> {
        debug!(file_id = id, "Fetching remote file content");
        let response = self
            .http
            .get(format!("{}/drive/v3/files/{}", self.api_base, id))
            .bearer_auth(grant.access_token())
            .query(&[("alt", "media")])
            .send()
            .await?;

        let content = Self::check(response).await?.text().await?;
        Ok(content)
    }

    async fn create(
        &self,
        grant: &Grant,
        name: &str,
        mime_type: &str,
    ) -> Result<String, RemoteError> {
        debug!(name, mime_type, "Creating remote file");
        let response = self
            .http
            .post(format!("{}/drive/v3/files", self.api_base))
            .bearer_auth(grant.access_token())
            .query(&[("fields", "id")])
            .json(&serde_json::json!({ "name": name, "mimeType": mime_type }))
            .send()
            .await?;

        let created: DriveCreated = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::MalformedResponse(e.to_string()))?;

        Ok(created.id)
    }

    async fn update(
        &self,
        grant: &Grant,
        id: &str,
        content: &str,
        content_type: &str,
    ) -> Result<(), RemoteError> {
        debug!(file_id = id, bytes = content.len(), "Uploading remote file content");
        let response = self
            .http
            .patch(format!("{}/upload/drive/v3/files/{}", self.api_base, id))
            .bearer_auth(grant.access_token())
            .query(&[("uploadType", "media")])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(content.to_string())
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_builds_client() {
        let store = DriveStore::new().unwrap();
        assert_eq!(store.api_base, API_BASE);
    }

    #[test]
    fn test_with_api_base_override() {
        let store = DriveStore::new()
            .unwrap()
            .with_api_base("http://localhost:9999");
        assert_eq!(store.api_base, "http://localhost:9999");
    }

    #[test]
    fn test_file_list_decoding() {
        let json = r#"{"files": [{"id": "abc123", "name": "CoachERP_data.json"}]}"#;
        let listing: DriveFileList = serde_json::from_str(json).unwrap();
        assert_eq!(listing.files.len(), 1);
        assert_eq!(listing.files[0].id, "abc123");
    }

    #[test]
    fn test_file_list_tolerates_missing_files_key() {
        let listing: DriveFileList = serde_json::from_str("{}").unwrap();
        assert!(listing.files.is_empty());
    }
}
