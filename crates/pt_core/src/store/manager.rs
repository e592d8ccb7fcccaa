use super::error::StoreError;
use super::format::{decompress_and_deserialize, serialize_and_compress, TournamentSave};

use once_cell::sync::Lazy;
use std::fs::{remove_file, rename, File};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Mutex;

// In-process cache of the last snapshot seen by save/load.
static CURRENT_SNAPSHOT: Lazy<Mutex<Option<TournamentSave>>> = Lazy::new(|| Mutex::new(None));

pub struct StoreManager;

impl StoreManager {
    /// Get the cached snapshot (thread-safe).
    pub fn get_current() -> Option<TournamentSave> {
        CURRENT_SNAPSHOT.lock().expect("CURRENT_SNAPSHOT lock poisoned").clone()
    }

    /// Replace the cached snapshot.
    pub fn update_current(save: TournamentSave) {
        *CURRENT_SNAPSHOT.lock().expect("CURRENT_SNAPSHOT lock poisoned") = Some(save);
    }

    /// Drop the cached snapshot.
    pub fn clear_current() {
        *CURRENT_SNAPSHOT.lock().expect("CURRENT_SNAPSHOT lock poisoned") = None;
    }

    /// Write a snapshot to the given path. Last write wins; the write is
    /// atomic (temp file + rename) so a crash never leaves a torn snapshot.
    pub fn save_to_path(path: &Path, save: &TournamentSave) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let data = serialize_and_compress(save)?;

        let temp_path = path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&data)?;
            file.flush()?;
            file.sync_all()?;
        }
        rename(&temp_path, path)?;

        Self::update_current(save.clone());
        log::debug!("Saved {} bytes to {:?}", data.len(), path);
        Ok(())
    }

    /// Read the full snapshot at the given path.
    pub fn load_from_path(path: &Path) -> Result<TournamentSave, StoreError> {
        if !path.exists() {
            return Err(StoreError::FileNotFound { path: path.display().to_string() });
        }

        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;

        let save = decompress_and_deserialize(&data)?;

        Self::update_current(save.clone());
        log::debug!("Loaded {} bytes from {:?}", data.len(), path);
        Ok(save)
    }

    /// The external reset signal: discard the persisted snapshot and the
    /// cached state, returning to an uninitialized roster.
    pub fn delete(path: &Path) -> Result<(), StoreError> {
        if path.exists() {
            remove_file(path)?;
            log::info!("Deleted snapshot {:?}", path);
        }
        Self::clear_current();
        Ok(())
    }

    pub fn snapshot_exists(path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegisteredTeam;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let save_path = temp_dir.path().join("tournament.save");

        let mut original = TournamentSave::new();
        original.roster.push(RegisteredTeam::new("Los Rodadores", "Ana", vec!["Ana".into()]));

        StoreManager::save_to_path(&save_path, &original).unwrap();
        let loaded = StoreManager::load_from_path(&save_path).unwrap();

        assert_eq!(original.version, loaded.version);
        assert_eq!(original.roster.len(), loaded.roster.len());
    }

    #[test]
    fn test_atomic_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let save_path = temp_dir.path().join("atomic.save");

        StoreManager::save_to_path(&save_path, &TournamentSave::new()).unwrap();

        assert!(save_path.exists());
        assert!(!save_path.with_extension("tmp").exists());
    }

    #[test]
    fn test_load_missing_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nothing.save");
        assert!(matches!(
            StoreManager::load_from_path(&missing),
            Err(StoreError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_delete_is_the_reset_signal() {
        let temp_dir = TempDir::new().unwrap();
        let save_path = temp_dir.path().join("tournament.save");

        StoreManager::save_to_path(&save_path, &TournamentSave::new()).unwrap();
        assert!(StoreManager::snapshot_exists(&save_path));

        StoreManager::delete(&save_path).unwrap();
        assert!(!StoreManager::snapshot_exists(&save_path));
        // Deleting an absent snapshot is a no-op, not an error.
        StoreManager::delete(&save_path).unwrap();
    }
}
