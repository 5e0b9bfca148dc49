//! Ledger snapshot persistence
//!
//! Provides save/load functionality for the ledger. The ledger itself is an
//! in-memory state machine; hosts use this to keep it across restarts.

use crate::ledger::Ledger;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub ledger_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".ledger_data"),
            ledger_file: "ledger.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Ledger snapshot storage
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    fn ledger_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.ledger_file)
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", self.config.ledger_file, index))
    }

    /// Save the ledger to disk
    pub fn save(&self, ledger: &Ledger) -> Result<(), StorageError> {
        let path = self.ledger_path();

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups()?;
            fs::copy(&path, self.backup_path(0))?;
        }

        // Write to a temporary file, then rename over the snapshot
        let temp_path = self.config.data_dir.join("ledger.tmp");
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);

        serde_json::to_writer_pretty(writer, ledger)?;
        fs::rename(&temp_path, &path)?;

        log::debug!("Ledger saved to {:?}", path);
        Ok(())
    }

    /// Load the ledger from disk
    pub fn load(&self) -> Result<Ledger, StorageError> {
        let path = self.ledger_path();

        if !path.exists() {
            return Err(StorageError::InvalidData(
                "Ledger file not found".to_string(),
            ));
        }

        read_snapshot(&path)
    }

    /// Check if a saved ledger exists
    pub fn exists(&self) -> bool {
        self.ledger_path().exists()
    }

    fn rotate_backups(&self) -> Result<(), StorageError> {
        let oldest = self.backup_path(self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(i);
            if current.exists() {
                fs::rename(&current, self.backup_path(i + 1))?;
            }
        }

        Ok(())
    }

    /// Restore from a backup
    pub fn restore_backup(&self, backup_index: usize) -> Result<Ledger, StorageError> {
        let backup_path = self.backup_path(backup_index);

        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} not found",
                backup_index
            )));
        }

        read_snapshot(&backup_path)
    }

    /// List available backups
    pub fn list_backups(&self) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(*i).exists())
            .collect()
    }
}

/// Save a ledger snapshot to a specific file path
pub fn save_to_file(ledger: &Ledger, path: &Path) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, ledger)?;
    Ok(())
}

/// Load a ledger snapshot from a specific file path
pub fn load_from_file(path: &Path) -> Result<Ledger, StorageError> {
    read_snapshot(path)
}

// Rejects snapshots whose balances do not add up to the total supply.
fn read_snapshot(path: &Path) -> Result<Ledger, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let ledger: Ledger = serde_json::from_reader(reader)?;

    if !ledger.verify_supply() {
        return Err(StorageError::InvalidData(format!(
            "Balances in {:?} do not add up to total supply {}",
            path,
            ledger.total_supply()
        )));
    }

    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Address, LedgerConfig};

    fn test_ledger() -> Ledger {
        Ledger::new(LedgerConfig::trd(
            Address::from_label("owner"),
            Address::from_label("first"),
            Address::from_label("second"),
        ))
        .unwrap()
    }

    fn test_storage(temp_dir: &tempfile::TempDir, max_backups: usize) -> Storage {
        Storage::new(StorageConfig {
            data_dir: temp_dir.path().to_path_buf(),
            max_backups,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_save_load_ledger() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&temp_dir, 5);
        let mut ledger = test_ledger();
        let owner = Address::from_label("owner");
        let receiver = Address::from_label("receiver");
        ledger.mint(&owner, &receiver, 1000).unwrap();

        storage.save(&ledger).unwrap();
        assert!(storage.exists());

        let loaded = storage.load().unwrap();
        assert_eq!(loaded.total_supply(), ledger.total_supply());
        assert_eq!(loaded.balance_of(&receiver), 1000);
        assert_eq!(loaded.history().count(), ledger.history().count());
    }

    #[test]
    fn test_load_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&temp_dir, 5);

        assert!(matches!(storage.load(), Err(StorageError::InvalidData(_))));
    }

    #[test]
    fn test_backup_rotation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = test_storage(&temp_dir, 3);
        let mut ledger = test_ledger();
        let owner = Address::from_label("owner");

        for _ in 0..5 {
            storage.save(&ledger).unwrap();
            ledger.mint(&owner, &owner, 1).unwrap();
        }

        assert_eq!(storage.list_backups(), vec![0, 1, 2]);

        // Backup 0 is the snapshot saved just before the latest one
        let restored = storage.restore_backup(0).unwrap();
        assert_eq!(restored.balance_of(&owner), 3);
    }

    #[test]
    fn test_reject_tampered_snapshot() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("export.json");
        save_to_file(&test_ledger(), &path).unwrap();

        let mut json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        json["total_supply"] = serde_json::Value::String("1".to_string());
        fs::write(&path, json.to_string()).unwrap();

        assert!(matches!(
            load_from_file(&path),
            Err(StorageError::InvalidData(_))
        ));
    }
}
