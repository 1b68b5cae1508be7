//! Snapshot persistence
//!
//! Saves and loads the AppState snapshot as JSON. Uses atomic writes
//! (write to temp file, then rename) so the snapshot is never left in a
//! partially-written state.
//!
//! Storage location: `<data_dir>/coacherp.json` (configurable via `Config`).

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::document;
use crate::models::AppState;
use crate::storage::error::{StorageError, StorageResult};

/// Persistence layer for the local AppState snapshot
pub struct SnapshotStore {
    config: Config,
}

impl SnapshotStore {
    /// Create a new snapshot store with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Check if a snapshot exists on disk
    pub fn exists(&self) -> bool {
        self.config.snapshot_path().exists()
    }

    /// Save the state to disk using atomic write
    pub fn save(&self, state: &AppState) -> StorageResult<()> {
        let path = self.config.snapshot_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = document::serialize_state(state);
        atomic_write(&path, json.as_bytes())?;
        debug!(path = %path.display(), bytes = json.len(), "Saved snapshot");
        Ok(())
    }

    /// Load the snapshot from disk
    ///
    /// Returns `None` if no snapshot exists yet. Returns an error if the
    /// file exists but cannot be read or parsed.
    pub fn load(&self) -> StorageResult<Option<AppState>> {
        let path = self.config.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|source| StorageError::ReadError {
            path: path.clone(),
            source,
        })?;

        let state: AppState =
            serde_json::from_str(&content).map_err(|e| StorageError::InvalidFormat {
                path: path.clone(),
                details: e.to_string(),
            })?;

        Ok(Some(state))
    }

    /// Load the snapshot, or start from an empty state
    pub fn load_or_default(&self) -> StorageResult<AppState> {
        Ok(self.load()?.unwrap_or_default())
    }
}

/// Write bytes atomically: write to a temp file in the same directory,
/// then rename over the target.
fn atomic_write(target: &Path, bytes: &[u8]) -> StorageResult<()> {
    let tmp: PathBuf = target.with_extension("json.tmp");

    let mut file =
        File::create(&tmp).map_err(|e| StorageError::from_io(e, tmp.clone()))?;
    file.write_all(bytes)
        .map_err(|e| StorageError::from_io(e, tmp.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, tmp.clone()))?;

    fs::rename(&tmp, target).map_err(|source| StorageError::AtomicWriteFailed {
        from: tmp,
        to: target.to_path_buf(),
        source,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TeamMember;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    #[test]
    fn test_load_missing_returns_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(test_config(&temp_dir));

        assert!(!store.exists());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_load_or_default_seeds_empty_state() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(test_config(&temp_dir));

        let state = store.load_or_default().unwrap();
        assert!(state.students.is_empty());
        assert!(state.batches.is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(test_config(&temp_dir));

        let mut state = AppState::default();
        state.batches.push("JEE Mains 2025".to_string());
        state.team_members.push(TeamMember {
            id: "TM001".to_string(),
            name: "Ravi Kumar".to_string(),
            role: "Physics Faculty".to_string(),
        });

        store.save(&state).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(test_config(&temp_dir));

        let mut state = AppState::default();
        store.save(&state).unwrap();

        state.batches.push("NEET 2025".to_string());
        store.save(&state).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.batches, vec!["NEET 2025".to_string()]);
    }

    #[test]
    fn test_corrupt_snapshot_is_invalid_format() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        fs::create_dir_all(&config.data_dir).unwrap();
        fs::write(config.snapshot_path(), "{broken").unwrap();

        let store = SnapshotStore::new(config);
        let err = store.load().unwrap_err();
        assert!(matches!(err, StorageError::InvalidFormat { .. }));
    }

    #[test]
    fn test_no_temp_file_left_behind() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(test_config(&temp_dir));

        store.save(&AppState::default()).unwrap();

        let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map(|x| x == "tmp").unwrap_or(false))
            .collect();
        assert!(leftovers.is_empty());
    }
}
