//! CoachERP Core Library
//!
//! This crate provides the core functionality for CoachERP, a single-admin
//! back office for a tutoring institute: students, fee payments, team
//! members, and batch groupings, persisted as one JSON document in the
//! user's own Google Drive.
//!
//! # Architecture
//!
//! - **AppStore**: single-writer in-memory state, the source of truth
//! - **SyncEngine**: reconciles the store with the remote document
//!   (pull on connect, debounced push on change)
//! - **SnapshotStore**: local JSON copy so the CLI works offline
//!
//! # Quick Start
//!
//! ```text
//! let store = Arc::new(Mutex::new(AppStore::new()));
//! let engine = SyncEngine::new(store.clone(), drive, auth, DEFAULT_FILE_NAME);
//!
//! engine.connect().await?;          // pull
//! store.lock().await.add_batch("NEET 2025");
//! engine.notify_change().await;     // debounced push
//! ```
//!
//! # Modules
//!
//! - `models`: Student, Payment, TeamMember, AppState
//! - `store`: local state store and reporting
//! - `document`: wire document codec
//! - `storage`: local snapshot persistence
//! - `remote`: remote object store trait + Google Drive client
//! - `auth`: grants, auth providers, session state
//! - `sync`: document locator, debounce scheduler, sync engine
//! - `config`: application configuration

pub mod auth;
pub mod config;
pub mod document;
pub mod models;
pub mod remote;
pub mod storage;
pub mod store;
pub mod sync;

pub use auth::{AuthError, AuthProvider, AuthSession, GoogleAuth, Grant, DRIVE_SCOPE};
pub use config::{Config, DEFAULT_FILE_NAME};
pub use document::{DocumentError, StateDocument};
pub use models::{AppState, Payment, PaymentMode, Student, StudentStatus, TeamMember};
pub use remote::{DriveStore, RemoteError, RemoteFile, RemoteStore};
pub use storage::{SnapshotStore, StorageError};
pub use store::{AppStore, DashboardStats, LedgerFilter, StoreError};
pub use sync::{DocumentLocator, SyncEngine, SyncError, SyncEvent, SyncStatus};
