//! Batch command handlers

use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::sync::Mutex;

use coacherp_core::AppStore;

use crate::output::Output;

/// Add a batch name
pub async fn add(store: &Arc<Mutex<AppStore>>, name: String, output: &Output) -> Result<()> {
    if name.trim().is_empty() {
        bail!("Batch name cannot be empty");
    }

    let mut store = store.lock().await;
    if store.batches().contains(&name) {
        bail!("Batch already exists: {}", name);
    }
    store.add_batch(name.clone());

    output.success(&format!("Added batch: {}", name));
    Ok(())
}

/// Remove a batch name
///
/// Students referencing the batch keep their label.
pub async fn remove(store: &Arc<Mutex<AppStore>>, name: String, output: &Output) -> Result<()> {
    let mut store = store.lock().await;
    if !store.batches().contains(&name) {
        bail!("Batch not found: {}", name);
    }
    store.remove_batch(&name);

    output.success(&format!("Removed batch: {}", name));
    Ok(())
}

/// List batches
pub async fn list(store: &Arc<Mutex<AppStore>>, output: &Output) -> Result<()> {
    let store = store.lock().await;
    output.print_batches(store.batches());
    Ok(())
}
