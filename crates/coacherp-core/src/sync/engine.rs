//! Sync engine
//!
//! Orchestrates pull-on-connect, debounced push-on-change, manual sync,
//! status tracking, and auth-failure recovery. At most one push or pull is
//! in flight at a time; the Syncing status flag is the mutual exclusion.
//!
//! Every sync failure is caught here and converted to a status flag plus a
//! logged diagnostic; nothing propagates to callers except `connect`'s own
//! authorization outcome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};

use crate::auth::{AuthError, AuthProvider, AuthSession, Grant, DRIVE_SCOPE};
use crate::document::{self, DocumentError, StateDocument};
use crate::remote::{RemoteError, RemoteStore};
use crate::store::AppStore;
use crate::sync::debounce::Debouncer;
use crate::sync::locator::DocumentLocator;

/// Quiet period before a change-triggered push fires
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(2);

const DOCUMENT_MIME: &str = "application/json";

/// Sync lifecycle status
///
/// Error and Synced both transition back to Syncing on the next trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No session, or nothing attempted yet
    Idle,
    /// A push or pull is in flight
    Syncing,
    /// Last operation succeeded
    Synced,
    /// Last operation failed
    Error,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "Idle"),
            SyncStatus::Syncing => write!(f, "Syncing"),
            SyncStatus::Synced => write!(f, "Synced"),
            SyncStatus::Error => write!(f, "Error"),
        }
    }
}

/// Events emitted by the sync engine
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Status changed
    StatusChanged(SyncStatus),
    /// Remote state was applied to the local store
    Pulled,
    /// Local state was written to the remote document
    Pushed,
    /// The session ended (explicit or forced by an auth failure)
    Disconnected,
    /// An operation failed
    Error(String),
}

/// Errors surfaced by sync operations
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Document(#[from] DocumentError),
}

struct Inner<R, A> {
    store: Arc<Mutex<AppStore>>,
    remote: R,
    auth: A,
    session: Mutex<AuthSession>,
    locator: Mutex<DocumentLocator>,
    debounce: Debouncer,
    window: Duration,
    /// Set when a change arrives while a push is in flight
    pending_change: AtomicBool,
    status_tx: watch::Sender<SyncStatus>,
    status_rx: watch::Receiver<SyncStatus>,
    event_tx: mpsc::UnboundedSender<SyncEvent>,
    event_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<SyncEvent>>>,
}

/// Sync engine handle; clones share one engine
pub struct SyncEngine<R, A> {
    inner: Arc<Inner<R, A>>,
}

impl<R, A> Clone for SyncEngine<R, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, A> SyncEngine<R, A>
where
    R: RemoteStore + Send + Sync + 'static,
    A: AuthProvider + Send + Sync + 'static,
{
    /// Create an engine over a shared store
    pub fn new(
        store: Arc<Mutex<AppStore>>,
        remote: R,
        auth: A,
        file_name: impl Into<String>,
    ) -> Self {
        let (status_tx, status_rx) = watch::channel(SyncStatus::Idle);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Self {
            inner: Arc::new(Inner {
                store,
                remote,
                auth,
                session: Mutex::new(AuthSession::new()),
                locator: Mutex::new(DocumentLocator::new(file_name)),
                debounce: Debouncer::new(),
                window: DEBOUNCE_WINDOW,
                pending_change: AtomicBool::new(false),
                status_tx,
                status_rx,
                event_tx,
                event_rx: std::sync::Mutex::new(Some(event_rx)),
            }),
        }
    }

    /// The current status
    pub fn status(&self) -> SyncStatus {
        *self.inner.status_rx.borrow()
    }

    /// Subscribe to status changes
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status_rx.clone()
    }

    /// Take the event receiver (can only be taken once)
    pub fn take_events(&self) -> Option<mpsc::UnboundedReceiver<SyncEvent>> {
        self.inner.event_rx.lock().unwrap().take()
    }

    /// The shared store this engine syncs
    pub fn store(&self) -> Arc<Mutex<AppStore>> {
        Arc::clone(&self.inner.store)
    }

    /// Whether a usable grant is currently held
    pub async fn is_connected(&self) -> bool {
        self.inner.session.lock().await.is_connected()
    }

    /// When the last successful sync finished
    pub async fn last_synced(&self) -> Option<DateTime<Utc>> {
        self.inner.session.lock().await.last_synced()
    }

    /// The cached remote document id, if located
    pub async fn document_id(&self) -> Option<String> {
        self.inner.locator.lock().await.cached().map(str::to_string)
    }

    /// Obtain a grant and hydrate local state from the remote document
    ///
    /// Authorization failures are returned to the caller; pull failures are
    /// captured as status like any other sync operation.
    pub async fn connect(&self) -> Result<(), SyncError> {
        self.resume().await?;
        info!("Authorized; hydrating from remote document");
        self.pull().await;
        Ok(())
    }

    /// Mark the session usable without hydrating from the remote document
    ///
    /// For callers whose local state is already authoritative, e.g. a fresh
    /// process resuming a previously authorized session to push offline
    /// edits.
    pub async fn resume(&self) -> Result<(), SyncError> {
        let grant = self.inner.auth.request_grant(DRIVE_SCOPE).await?;
        self.inner.session.lock().await.install(grant);
        Ok(())
    }

    /// End the session: revoke the grant, clear cached state, reset status
    ///
    /// Idempotent; disconnecting with no active grant is a no-op.
    pub async fn disconnect(&self) {
        let grant = self.inner.session.lock().await.clear();
        let Some(grant) = grant else {
            debug!("Disconnect with no active grant; nothing to do");
            return;
        };

        self.inner.debounce.cancel();
        self.inner.pending_change.store(false, Ordering::SeqCst);

        if let Err(err) = self.inner.auth.revoke(&grant).await {
            warn!(error = %err, "Grant revocation failed");
        }

        self.inner.locator.lock().await.forget();
        self.set_status(SyncStatus::Idle);
        self.emit(SyncEvent::Disconnected);
        info!("Disconnected");
    }

    /// Note a local mutation and schedule a debounced push
    ///
    /// No-op while disconnected. The quiet window restarts on every call;
    /// a push already in flight defers scheduling until it resolves.
    pub async fn notify_change(&self) {
        if !self.inner.session.lock().await.is_connected() {
            debug!("Ignoring change while disconnected");
            return;
        }
        if self.status() == SyncStatus::Syncing {
            debug!("Push in flight; deferring schedule");
            self.inner.pending_change.store(true, Ordering::SeqCst);
            return;
        }
        self.schedule_push();
    }

    /// Push immediately, bypassing the debounce window
    pub async fn sync_now(&self) {
        self.inner.debounce.cancel();
        self.push().await;
    }

    fn schedule_push(&self) {
        debug!("Scheduling push");
        let engine = self.clone();
        self.inner.debounce.schedule(self.inner.window, async move {
            engine.push().await;
        });
    }

    /// Gate an operation on the connected state and the single-flight flag
    ///
    /// On success the status is already Syncing and the caller owns the
    /// operation until it resolves.
    async fn begin(&self, op: &str) -> Option<(Grant, u64)> {
        let session = self.inner.session.lock().await;
        let Some(grant) = session.grant().cloned() else {
            debug!(operation = op, "Skipped; not connected");
            return None;
        };
        let generation = session.generation();
        drop(session);

        if self.status() == SyncStatus::Syncing {
            debug!(operation = op, "Sync already in flight");
            return None;
        }
        self.set_status(SyncStatus::Syncing);
        Some((grant, generation))
    }

    /// Read the remote document and replace local state wholesale
    async fn pull(&self) {
        let Some((grant, generation)) = self.begin("pull").await else {
            return;
        };

        match self.fetch_document(&grant).await {
            Ok(doc) => {
                let mut session = self.inner.session.lock().await;
                if session.generation() != generation {
                    debug!("Discarding pull result from a stale session");
                    return;
                }
                let applied = doc.is_some();
                if let Some(doc) = doc {
                    let mut store = self.inner.store.lock().await;
                    doc.apply(&mut store);
                }
                session.mark_synced(Utc::now());
                drop(session);
                self.set_status(SyncStatus::Synced);
                if applied {
                    self.emit(SyncEvent::Pulled);
                }
                info!("Pull complete");
            }
            Err(err) => self.handle_failure("pull", err, generation).await,
        }
    }

    async fn fetch_document(&self, grant: &Grant) -> Result<Option<StateDocument>, SyncError> {
        let file_id = self
            .inner
            .locator
            .lock()
            .await
            .locate(&self.inner.remote, grant)
            .await?;
        let content = self.inner.remote.get(grant, &file_id).await?;
        match StateDocument::parse(&content) {
            Ok(doc) => Ok(Some(doc)),
            Err(DocumentError::Empty) => {
                debug!("Remote document empty; nothing to hydrate");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Serialize the full state and overwrite the remote document
    async fn push(&self) {
        let Some((grant, generation)) = self.begin("push").await else {
            return;
        };

        let content = {
            let store = self.inner.store.lock().await;
            document::serialize_state(&store.snapshot())
        };

        match self.write_document(&grant, &content).await {
            Ok(()) => {
                let mut session = self.inner.session.lock().await;
                if session.generation() != generation {
                    debug!("Discarding push result from a stale session");
                    return;
                }
                session.mark_synced(Utc::now());
                drop(session);
                self.set_status(SyncStatus::Synced);
                self.emit(SyncEvent::Pushed);
                info!(bytes = content.len(), "Push complete");
            }
            Err(err) => self.handle_failure("push", err, generation).await,
        }

        // Changes that arrived while we were in flight restart the window
        if self.inner.pending_change.swap(false, Ordering::SeqCst)
            && self.inner.session.lock().await.is_connected()
        {
            self.schedule_push();
        }
    }

    async fn write_document(&self, grant: &Grant, content: &str) -> Result<(), SyncError> {
        let file_id = self
            .inner
            .locator
            .lock()
            .await
            .locate(&self.inner.remote, grant)
            .await?;
        self.inner
            .remote
            .update(grant, &file_id, content, DOCUMENT_MIME)
            .await?;
        Ok(())
    }

    /// Convert a failed operation into status + diagnostics
    ///
    /// An authorization failure additionally forces a disconnect so the
    /// user is returned to a clean reconnect state instead of retrying
    /// against a dead credential.
    async fn handle_failure(&self, op: &str, err: SyncError, generation: u64) {
        {
            let session = self.inner.session.lock().await;
            if session.generation() != generation {
                debug!(operation = op, "Discarding failure from a stale session");
                return;
            }
        }

        warn!(operation = op, error = %err, "Sync failed");
        self.set_status(SyncStatus::Error);
        self.emit(SyncEvent::Error(err.to_string()));

        if matches!(err, SyncError::Remote(RemoteError::Unauthorized)) {
            warn!("Grant rejected by the remote store; forcing disconnect");
            self.disconnect().await;
        }
    }

    fn set_status(&self, status: SyncStatus) {
        let _ = self.inner.status_tx.send(status);
        self.emit(SyncEvent::StatusChanged(status));
    }

    fn emit(&self, event: SyncEvent) {
        let _ = self.inner.event_tx.send(event);
    }
}
