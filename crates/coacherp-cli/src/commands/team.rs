//! Team command handlers

use std::sync::Arc;

use anyhow::{bail, Result};
use tokio::sync::Mutex;

use coacherp_core::AppStore;

use crate::output::Output;

/// Add a team member
pub async fn add(
    store: &Arc<Mutex<AppStore>>,
    name: String,
    role: String,
    output: &Output,
) -> Result<()> {
    let mut store = store.lock().await;
    let member = store.add_team_member(name, role);

    output.success(&format!("Added team member: {}", member.id));
    Ok(())
}

/// Remove a team member by id
pub async fn remove(store: &Arc<Mutex<AppStore>>, id: String, output: &Output) -> Result<()> {
    let mut store = store.lock().await;
    if !store.team_members().iter().any(|m| m.id == id) {
        bail!("Team member not found: {}", id);
    }
    store.remove_team_member(&id);

    output.success(&format!("Removed team member: {}", id));
    Ok(())
}

/// List team members
pub async fn list(store: &Arc<Mutex<AppStore>>, output: &Output) -> Result<()> {
    let store = store.lock().await;
    output.print_team(store.team_members());
    Ok(())
}
