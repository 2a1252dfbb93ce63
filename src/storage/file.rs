use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::DurableStorage;
use crate::error::{AppError, AppResult};

/// Storage backed by one JSON object file (`{"token": "...", "user": "..."}`).
///
/// Every call re-reads the file so writes from other processes (the login flow)
/// are visible. A missing file is empty storage. Writes go to a sibling temp
/// file first and are renamed into place.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path { &self.path }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_text(&self) -> AppResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(t) if t.trim().is_empty() => Ok(None),
            Ok(t) => Ok(Some(t)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::storage("read_failed".to_string(), format!("{}: {}", self.path.display(), e))),
        }
    }

    fn load(&self) -> AppResult<BTreeMap<String, String>> {
        let Some(text) = self.read_text()? else { return Ok(BTreeMap::new()); };
        serde_json::from_str::<BTreeMap<String, String>>(&text)
            .map_err(|e| AppError::storage("corrupt_storage_file".to_string(), format!("{}: {}", self.path.display(), e)))
    }

    fn save(&self, map: &BTreeMap<String, String>) -> AppResult<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() { std::fs::create_dir_all(dir)?; }
        }
        let tmp = self.tmp_path();
        let text = serde_json::to_string_pretty(map)?;
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(target: "storage", "wrote {} keys to {}", map.len(), self.path.display());
        Ok(())
    }

    /// Writes start over from an empty object when the file is not valid
    /// JSON, so a corrupted file is replaced instead of blocking every write.
    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> bool) -> AppResult<()> {
        let _g = self.write_lock.lock();
        let (mut map, reset) = match self.load() {
            Ok(m) => (m, false),
            Err(AppError::Storage { code, message }) if code == "corrupt_storage_file" => {
                warn!(target: "storage", "replacing unreadable storage file: {}", message);
                (BTreeMap::new(), true)
            }
            Err(e) => return Err(e),
        };
        if f(&mut map) || reset { self.save(&map)?; }
        Ok(())
    }
}

impl DurableStorage for FileStorage {
    fn get(&self, key: &str) -> AppResult<Option<String>> { Ok(self.load()?.get(key).cloned()) }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.update(|m| {
            m.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.update(|m| m.remove(key).is_some())
    }
}
