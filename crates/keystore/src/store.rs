use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use alloy_primitives::Address;

use crate::error::KeystoreError;
use crate::record::EncryptedKey;

/// Persistent backing for encrypted key records.
///
/// Implementations only move opaque records; all cryptography stays in the
/// keystore itself.
pub trait RecordStore: Send + Sync {
    fn load(&self, address: Address) -> Result<Option<EncryptedKey>, KeystoreError>;
    fn save(&self, record: &EncryptedKey) -> Result<(), KeystoreError>;
    fn remove(&self, address: Address) -> Result<(), KeystoreError>;
    fn addresses(&self) -> Result<Vec<Address>, KeystoreError>;
}

/// One JSON file per address inside a keystore directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens a keystore directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, KeystoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(storage)?;
        Ok(Self { dir })
    }

    fn record_path(&self, address: Address) -> PathBuf {
        self.dir
            .join(format!("0x{}.json", hex::encode(address.as_slice())))
    }
}

impl RecordStore for FileStore {
    fn load(&self, address: Address) -> Result<Option<EncryptedKey>, KeystoreError> {
        let bytes = match fs::read(self.record_path(address)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage(e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| KeystoreError::Corrupt(e.to_string()))
    }

    fn save(&self, record: &EncryptedKey) -> Result<(), KeystoreError> {
        let json = serde_json::to_vec_pretty(record).map_err(|e| storage(e.into()))?;

        // Write-then-rename so a record is replaced atomically; a crash
        // mid-write leaves the previous record intact.
        let path = self.record_path(record.address);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json).map_err(storage)?;
        fs::rename(&tmp, &path).map_err(storage)
    }

    fn remove(&self, address: Address) -> Result<(), KeystoreError> {
        match fs::remove_file(self.record_path(address)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage(e)),
        }
    }

    fn addresses(&self) -> Result<Vec<Address>, KeystoreError> {
        let mut found = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(storage)? {
            let path = entry.map_err(storage)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let stem = path.file_stem().and_then(|s| s.to_str());
            if let Some(address) = stem.and_then(|s| s.parse::<Address>().ok()) {
                found.push(address);
            }
        }
        Ok(found)
    }
}

fn storage(e: io::Error) -> KeystoreError {
    KeystoreError::Storage(e.to_string())
}

/// Volatile store for tests and ephemeral keys.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<Address, EncryptedKey>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn load(&self, address: Address) -> Result<Option<EncryptedKey>, KeystoreError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(&address).cloned())
    }

    fn save(&self, record: &EncryptedKey) -> Result<(), KeystoreError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.insert(record.address, record.clone());
        Ok(())
    }

    fn remove(&self, address: Address) -> Result<(), KeystoreError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.remove(&address);
        Ok(())
    }

    fn addresses(&self) -> Result<Vec<Address>, KeystoreError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.keys().copied().collect())
    }
}
