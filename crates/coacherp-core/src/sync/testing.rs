//! In-memory test doubles for the remote store and auth provider

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::auth::{AuthError, AuthProvider, Grant};
use crate::remote::{RemoteError, RemoteFile, RemoteStore};

#[derive(Debug, Default)]
struct RemoteState {
    /// (id, name, content)
    files: Vec<(String, String, String)>,
    next_id: usize,
    /// Virtual timestamps of update calls
    update_instants: Vec<tokio::time::Instant>,
    get_delay: Option<Duration>,
    update_delay: Option<Duration>,
}

/// In-memory `RemoteStore` with call counting and failure injection
#[derive(Debug, Default)]
pub(crate) struct MemoryRemote {
    state: Mutex<RemoteState>,
    calls: AtomicUsize,
    creates: AtomicUsize,
    updates: AtomicUsize,
    fail_unauthorized: AtomicBool,
    fail_api: AtomicBool,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_file(&self, name: &str, content: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("file-{}", state.next_id);
        state
            .files
            .push((id.clone(), name.to_string(), content.to_string()));
        id
    }

    pub fn content(&self, id: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .files
            .iter()
            .find(|(fid, _, _)| fid == id)
            .map(|(_, _, content)| content.clone())
    }

    pub fn file_name(&self, id: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .files
            .iter()
            .find(|(fid, _, _)| fid == id)
            .map(|(_, name, _)| name.clone())
    }

    /// Total network calls of any kind
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn update_instants(&self) -> Vec<tokio::time::Instant> {
        self.state.lock().unwrap().update_instants.clone()
    }

    /// Make every call fail with `RemoteError::Unauthorized`
    pub fn fail_unauthorized(&self, enabled: bool) {
        self.fail_unauthorized.store(enabled, Ordering::SeqCst);
    }

    /// Make every call fail with a 503
    pub fn fail_api(&self, enabled: bool) {
        self.fail_api.store(enabled, Ordering::SeqCst);
    }

    /// Delay `get` responses by a virtual duration
    pub fn set_get_delay(&self, delay: Option<Duration>) {
        self.state.lock().unwrap().get_delay = delay;
    }

    /// Delay `update` responses by a virtual duration
    pub fn set_update_delay(&self, delay: Option<Duration>) {
        self.state.lock().unwrap().update_delay = delay;
    }

    fn check_failures(&self) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_unauthorized.load(Ordering::SeqCst) {
            return Err(RemoteError::Unauthorized);
        }
        if self.fail_api.load(Ordering::SeqCst) {
            return Err(RemoteError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        Ok(())
    }
}

impl RemoteStore for MemoryRemote {
    async fn list(&self, _grant: &Grant, name: &str) -> Result<Vec<RemoteFile>, RemoteError> {
        self.check_failures()?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .files
            .iter()
            .filter(|(_, fname, _)| fname == name)
            .map(|(id, fname, _)| RemoteFile {
                id: id.clone(),
                name: fname.clone(),
            })
            .collect())
    }

    async fn get(&self, _grant: &Grant, id: &str) -> Result<String, RemoteError> {
        self.check_failures()?;
        let delay = self.state.lock().unwrap().get_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.content(id).ok_or(RemoteError::Api {
            status: 404,
            message: format!("file not found: {}", id),
        })
    }

    async fn create(
        &self,
        _grant: &Grant,
        name: &str,
        _mime_type: &str,
    ) -> Result<String, RemoteError> {
        self.check_failures()?;
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(self.seed_file(name, ""))
    }

    async fn update(
        &self,
        _grant: &Grant,
        id: &str,
        content: &str,
        _content_type: &str,
    ) -> Result<(), RemoteError> {
        self.check_failures()?;
        let delay = self.state.lock().unwrap().update_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.updates.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();
        state.update_instants.push(tokio::time::Instant::now());
        let slot = state
            .files
            .iter_mut()
            .find(|(fid, _, _)| fid == id)
            .ok_or(RemoteError::Api {
                status: 404,
                message: format!("file not found: {}", id),
            })?;
        slot.2 = content.to_string();
        Ok(())
    }
}

/// `AuthProvider` test double handing out sequential tokens
#[derive(Debug, Default)]
pub(crate) struct MemoryAuth {
    issued: AtomicUsize,
    revoked: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_requests(&self, enabled: bool) {
        self.fail.store(enabled, Ordering::SeqCst);
    }

    pub fn revoked_tokens(&self) -> Vec<String> {
        self.revoked.lock().unwrap().clone()
    }
}

impl AuthProvider for MemoryAuth {
    async fn request_grant(&self, _scope: &str) -> Result<Grant, AuthError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AuthError::Rejected("consent denied".to_string()));
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Grant::new(format!("token-{}", n)))
    }

    async fn revoke(&self, grant: &Grant) -> Result<(), AuthError> {
        self.revoked
            .lock()
            .unwrap()
            .push(grant.access_token().to_string());
        Ok(())
    }
}
