//! Durable snapshot storage
//!
//! The whole timer collection is written under a single fixed key after every
//! mutation and read back once at startup.

pub mod file_storage;
pub mod memory_storage;

use serde::{Deserialize, Serialize};

use crate::{error::StorageError, state::Timer};

pub use file_storage::JsonFileStorage;
pub use memory_storage::MemoryStorage;

/// Key every snapshot is stored under
pub const ROOT_KEY: &str = "root";

/// Minimal key-value persistence contract
pub trait SnapshotStorage: Send + Sync {
    /// Read the raw value for `key`, `None` if nothing was ever saved
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Serialized form of the full collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub timers: Vec<Timer>,
}

impl Snapshot {
    pub fn new(timers: Vec<Timer>) -> Self {
        Self { timers }
    }

    pub fn to_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, StorageError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Load the snapshot stored under [`ROOT_KEY`], empty if absent
    pub fn read_from(storage: &dyn SnapshotStorage) -> Result<Self, StorageError> {
        match storage.load(ROOT_KEY)? {
            Some(raw) => Self::from_json(&raw),
            None => Ok(Self::default()),
        }
    }

    pub fn write_to(&self, storage: &dyn SnapshotStorage) -> Result<(), StorageError> {
        storage.save(ROOT_KEY, &self.to_json()?)
    }
}
