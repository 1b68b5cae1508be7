//! Remote document sync
//!
//! Reconciles the in-memory `AppStore` with a single JSON document in the
//! user's cloud storage:
//!
//! 1. On connect, the remote document is pulled and hydrates local state.
//! 2. Local mutations schedule a debounced push of the full state.
//! 3. A manual sync pushes immediately.
//!
//! Status is published as `Idle -> Syncing -> {Synced, Error}`; an
//! authorization failure forces a disconnect so the user is returned to a
//! clean reconnect state.

mod debounce;
mod engine;
mod locator;

#[cfg(test)]
pub(crate) mod testing;

pub use debounce::Debouncer;
pub use engine::{SyncEngine, SyncError, SyncEvent, SyncStatus, DEBOUNCE_WINDOW};
pub use locator::DocumentLocator;
