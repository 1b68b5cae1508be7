//! Drive account command handlers: connect, disconnect, sync, status

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::sync::Mutex;

use coacherp_core::{
    AppStore, AuthProvider, Config, DriveStore, GoogleAuth, Grant, SnapshotStore, StudentStatus,
    SyncEngine, SyncStatus, DRIVE_SCOPE,
};

use crate::output::{Output, OutputFormat};

fn build_engine(
    config: &Config,
    store: &Arc<Mutex<AppStore>>,
    token: String,
) -> Result<SyncEngine<DriveStore, GoogleAuth>> {
    let remote = DriveStore::new().context("Failed to build Drive client")?;
    let auth = GoogleAuth::new(config.client_id.clone(), Some(token))
        .context("Failed to build auth provider")?;
    Ok(SyncEngine::new(
        Arc::clone(store),
        remote,
        auth,
        &config.file_name,
    ))
}

/// Authorize Drive access and hydrate local state from the remote document
pub async fn connect(
    config: &Config,
    snapshots: &SnapshotStore,
    store: &Arc<Mutex<AppStore>>,
    output: &Output,
) -> Result<()> {
    let (token, newly_entered) = resolve_token(config, output)?;

    let engine = build_engine(config, store, token.clone())?;
    engine.connect().await?;

    match engine.status() {
        SyncStatus::Synced => {
            snapshots.save(&store.lock().await.snapshot())?;
            if newly_entered {
                let mut config = config.clone();
                config.access_token = Some(token);
                config.save()?;
            }
            output.success("Connected to Google Drive");
            if let Some(at) = engine.last_synced().await {
                output.message(&format!("Last sync: {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
            }
            Ok(())
        }
        SyncStatus::Idle => {
            forget_token(config)?;
            bail!("Authorization rejected; the token is not usable. Obtain a fresh one and reconnect.");
        }
        status => bail!("Initial sync failed (status: {})", status),
    }
}

/// Revoke Drive access and clear the stored token
pub async fn disconnect(config: &Config, output: &Output) -> Result<()> {
    let Some(token) = config.access_token.clone() else {
        output.message("No Drive connection configured; nothing to do.");
        return Ok(());
    };

    let auth = GoogleAuth::new(config.client_id.clone(), None)?;
    if let Err(err) = auth.revoke(&Grant::new(token)).await {
        // The token may already be expired; clearing it locally still applies
        tracing::warn!(error = %err, "Token revocation failed");
    }

    forget_token(config)?;
    output.success("Disconnected from Google Drive");
    Ok(())
}

/// Push the local state to the remote document now
pub async fn sync(config: &Config, store: &Arc<Mutex<AppStore>>, output: &Output) -> Result<()> {
    let Some(token) = config.access_token.clone() else {
        bail!(
            "Not connected. Connect first with:\n  \
             coacherp connect"
        );
    };

    let engine = build_engine(config, store, token)?;
    engine.resume().await?;

    output.message("Syncing with Google Drive...");
    engine.sync_now().await;

    match engine.status() {
        SyncStatus::Synced => {
            output.success("Sync complete");
            if let Some(at) = engine.last_synced().await {
                output.message(&format!("Last sync: {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
            }
            Ok(())
        }
        SyncStatus::Idle => {
            // An authorization failure forced a disconnect
            forget_token(config)?;
            bail!("Authorization rejected; signed out. Reconnect with `coacherp connect`.");
        }
        status => bail!("Sync failed (status: {})", status),
    }
}

/// Show configuration, contents, and sync setup
pub async fn status(
    config: &Config,
    store: &Arc<Mutex<AppStore>>,
    output: &Output,
) -> Result<()> {
    let store = store.lock().await;
    let active = store
        .students()
        .iter()
        .filter(|s| s.status == StudentStatus::Active)
        .count();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "remote_document": config.file_name,
                    "connected": config.access_token.is_some(),
                    "storage": {
                        "data_dir": config.data_dir,
                        "snapshot_exists": config.snapshot_path().exists(),
                    },
                    "counts": {
                        "students": store.students().len(),
                        "active_students": active,
                        "team_members": store.team_members().len(),
                        "batches": store.batches().len(),
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!(
                "{}",
                if config.access_token.is_some() {
                    "connected"
                } else {
                    "disconnected"
                }
            );
        }
        OutputFormat::Human => {
            println!("CoachERP Status");
            println!("===============");
            println!();
            println!("Remote document:");
            println!("  Name: {}", config.file_name);
            println!();
            println!("Drive:");
            println!(
                "  Connection: {}",
                if config.access_token.is_some() {
                    "configured"
                } else {
                    "not configured"
                }
            );
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!(
                "  Snapshot: {}",
                if config.snapshot_path().exists() {
                    "present"
                } else {
                    "none"
                }
            );
            println!();
            println!("Contents:");
            println!("  Students:     {} ({} active)", store.students().len(), active);
            println!("  Team members: {}", store.team_members().len());
            println!("  Batches:      {}", store.batches().len());
        }
    }

    Ok(())
}

/// Get a usable access token from config or the user
///
/// Returns the token and whether it was entered interactively (and should
/// be persisted after a successful connect).
fn resolve_token(config: &Config, output: &Output) -> Result<(String, bool)> {
    if let Some(token) = config.access_token.clone() {
        return Ok((token, false));
    }

    let auth = GoogleAuth::new(config.client_id.clone(), None)?;
    match auth.consent_url(DRIVE_SCOPE) {
        Some(url) => {
            output.message("Authorize CoachERP in your browser, then paste the access token.");
            output.message(&format!("  {}", url));
            if open::that(&url).is_err() {
                output.message("(could not open a browser; visit the URL manually)");
            }
        }
        None => {
            output.message(
                "No client_id configured; obtain an access token for the drive.file scope \
                 (e.g. from the OAuth playground) and paste it below.",
            );
        }
    }

    print!("Access token: ");
    io::stdout().flush()?;
    let mut token = String::new();
    io::stdin().read_line(&mut token)?;
    let token = token.trim().to_string();

    if token.is_empty() {
        bail!("No access token provided");
    }
    Ok((token, true))
}

/// Drop the stored access token
fn forget_token(config: &Config) -> Result<()> {
    let mut config = config.clone();
    config.access_token = None;
    config.save()
}
