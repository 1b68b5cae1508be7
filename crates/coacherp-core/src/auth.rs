//! Authorization session
//!
//! Access to the remote store is gated by a time-limited grant obtained
//! from an authorization provider. The provider is consumed through the
//! `AuthProvider` trait; `GoogleAuth` is the production implementation
//! working with a pre-obtained OAuth access token (the interactive consent
//! screen itself belongs to the browser, not this library).
//!
//! The `AuthSession` lives inside the sync engine. Its generation counter
//! is the stale-result guard: every disconnect bumps it, and an async
//! operation started under an older generation discards its result.

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

/// OAuth scope requested from the provider
///
/// Limited to files created by this application (least privilege).
pub const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

const REVOKE_ENDPOINT: &str = "https://oauth2.googleapis.com/revoke";

/// Errors from the authorization provider
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token is available and none can be obtained non-interactively
    #[error("No access token available. Set COACHERP_ACCESS_TOKEN or run `coacherp connect`.")]
    NoToken,

    /// The provider rejected the request
    #[error("Authorization failed: {0}")]
    Rejected(String),

    /// The provider could not be reached
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A usable access grant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    access_token: String,
    obtained_at: DateTime<Utc>,
}

impl Grant {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            obtained_at: Utc::now(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }
}

/// An authorization provider: obtain and revoke grants
pub trait AuthProvider {
    /// Obtain a grant for the given scope
    fn request_grant(
        &self,
        scope: &str,
    ) -> impl Future<Output = Result<Grant, AuthError>> + Send;

    /// Revoke a grant with the provider
    fn revoke(&self, grant: &Grant) -> impl Future<Output = Result<(), AuthError>> + Send;
}

// Shared handles work wherever a provider is expected
impl<T: AuthProvider + Send + Sync> AuthProvider for std::sync::Arc<T> {
    fn request_grant(
        &self,
        scope: &str,
    ) -> impl Future<Output = Result<Grant, AuthError>> + Send {
        (**self).request_grant(scope)
    }

    fn revoke(&self, grant: &Grant) -> impl Future<Output = Result<(), AuthError>> + Send {
        (**self).revoke(grant)
    }
}

/// Google OAuth provider working from a pre-obtained access token
#[derive(Debug, Clone)]
pub struct GoogleAuth {
    client_id: Option<String>,
    access_token: Option<String>,
    http: reqwest::Client,
}

impl GoogleAuth {
    pub fn new(client_id: Option<String>, access_token: Option<String>) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("coacherp/1.0")
            .build()?;
        Ok(Self {
            client_id,
            access_token,
            http,
        })
    }

    /// The consent URL a user must visit to authorize this application
    ///
    /// Returns `None` when no client id is configured.
    pub fn consent_url(&self, scope: &str) -> Option<String> {
        let client_id = self.client_id.as_deref()?;
        Some(format!(
            "https://accounts.google.com/o/oauth2/v2/auth?client_id={}&response_type=token&scope={}&redirect_uri=urn:ietf:wg:oauth:2.0:oob",
            urlencoding::encode(client_id),
            urlencoding::encode(scope),
        ))
    }
}

impl AuthProvider for GoogleAuth {
    async fn request_grant(&self, _scope: &str) -> Result<Grant, AuthError> {
        match &self.access_token {
            Some(token) => {
                debug!("Using configured access token");
                Ok(Grant::new(token.clone()))
            }
            None => Err(AuthError::NoToken),
        }
    }

    async fn revoke(&self, grant: &Grant) -> Result<(), AuthError> {
        debug!("Revoking access token");
        let response = self
            .http
            .post(REVOKE_ENDPOINT)
            .form(&[("token", grant.access_token())])
            .send()
            .await?;

        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected(message));
        }
        Ok(())
    }
}

/// Session state owned by the sync engine
#[derive(Debug, Default)]
pub struct AuthSession {
    grant: Option<Grant>,
    generation: u64,
    last_synced: Option<DateTime<Utc>>,
}

impl AuthSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a usable grant is currently held
    pub fn is_connected(&self) -> bool {
        self.grant.is_some()
    }

    pub fn grant(&self) -> Option<&Grant> {
        self.grant.as_ref()
    }

    /// Install a fresh grant
    pub fn install(&mut self, grant: Grant) {
        self.grant = Some(grant);
    }

    /// Clear the session, bumping the generation so in-flight operations
    /// started before the disconnect discard their results.
    ///
    /// Returns the grant that was held, if any.
    pub fn clear(&mut self) -> Option<Grant> {
        self.generation += 1;
        self.last_synced = None;
        self.grant.take()
    }

    /// Current generation; captured at the start of an async operation and
    /// compared before applying its result.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.last_synced
    }

    pub fn mark_synced(&mut self, at: DateTime<Utc>) {
        self.last_synced = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_starts_disconnected() {
        let session = AuthSession::new();
        assert!(!session.is_connected());
        assert!(session.last_synced().is_none());
        assert_eq!(session.generation(), 0);
    }

    #[test]
    fn test_install_and_clear() {
        let mut session = AuthSession::new();
        session.install(Grant::new("token-1"));
        assert!(session.is_connected());

        let taken = session.clear();
        assert_eq!(taken.unwrap().access_token(), "token-1");
        assert!(!session.is_connected());
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut session = AuthSession::new();
        assert!(session.clear().is_none());
        assert!(session.clear().is_none());
    }

    #[test]
    fn test_clear_resets_last_synced() {
        let mut session = AuthSession::new();
        session.install(Grant::new("token-1"));
        session.mark_synced(Utc::now());
        assert!(session.last_synced().is_some());

        session.clear();
        assert!(session.last_synced().is_none());
    }

    #[test]
    fn test_consent_url_needs_client_id() {
        let auth = GoogleAuth::new(None, None).unwrap();
        assert!(auth.consent_url(DRIVE_SCOPE).is_none());

        let auth = GoogleAuth::new(Some("abc.apps.googleusercontent.com".to_string()), None)
            .unwrap();
        let url = auth.consent_url(DRIVE_SCOPE).unwrap();
        assert!(url.contains("accounts.google.com"));
        assert!(url.contains("drive.file"));
    }

    #[tokio::test]
    async fn test_request_grant_without_token_fails() {
        let auth = GoogleAuth::new(None, None).unwrap();
        let err = auth.request_grant(DRIVE_SCOPE).await.unwrap_err();
        assert!(matches!(err, AuthError::NoToken));
    }

    #[tokio::test]
    async fn test_request_grant_with_token() {
        let auth = GoogleAuth::new(None, Some("ya29.token".to_string())).unwrap();
        let grant = auth.request_grant(DRIVE_SCOPE).await.unwrap();
        assert_eq!(grant.access_token(), "ya29.token");
    }
}
