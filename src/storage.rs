//!
//! Durable local storage
//! ---------------------
//! The dashboard keeps two string entries across restarts: the bearer token and
//! the serialized identity. This module defines the narrow interface the access
//! layer reads them through, plus two backends: an in-process map and a single
//! JSON file on disk.

use serde::{Deserialize, Serialize};

use crate::error::AppResult;

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

/// String key/value storage that survives the application.
pub trait DurableStorage: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// Names of the two storage entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageKeys {
    #[serde(default = "StorageKeys::default_token")]
    pub token: String,
    #[serde(default = "StorageKeys::default_identity")]
    pub identity: String,
}

impl StorageKeys {
    fn default_token() -> String { "token".to_string() }
    fn default_identity() -> String { "user".to_string() }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self { token: Self::default_token(), identity: Self::default_identity() }
    }
}
