//!
//! Persistence bridge
//! ------------------
//! Restores the session store from durable storage once at startup. Stored
//! state that cannot be read or parsed is treated as corrupted: both entries
//! are deleted and the session stays unauthenticated. Nothing is surfaced to
//! the user; the worst case is a silent "please log in".
//!
//! Writing back on login/logout is the job of [`SessionPersister`], which
//! observes the store instead of being called by it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::identity::{Credential, Identity, SessionStore};
use crate::storage::{DurableStorage, StorageKeys};

mod persister;

pub use persister::SessionPersister;

/// How a restore attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Token and identity were present and valid.
    Restored,
    /// One or both entries were missing; nothing changed.
    Absent,
    /// Stored data was unreadable or malformed and has been deleted.
    Discarded,
}

/// Holds the loading flag up for as long as it lives.
struct LoadingGuard<'a> {
    store: &'a SessionStore,
}

impl<'a> LoadingGuard<'a> {
    fn start(store: &'a SessionStore) -> Self {
        store.set_loading(true);
        Self { store }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) { self.store.set_loading(false); }
}

fn read_stored(storage: &dyn DurableStorage, keys: &StorageKeys) -> AppResult<Option<(Identity, Credential)>> {
    let token = storage.get(&keys.token)?.filter(|t| !t.is_empty());
    let raw = storage.get(&keys.identity)?.filter(|s| !s.is_empty());
    let (Some(token), Some(raw)) = (token, raw) else { return Ok(None); };
    let identity: Identity = serde_json::from_str(&raw)?;
    Ok(Some((identity, Credential::new(token))))
}

fn discard(storage: &dyn DurableStorage, keys: &StorageKeys) {
    for key in [&keys.token, &keys.identity] {
        if let Err(e) = storage.remove(key) {
            warn!(target: "bridge", "failed to remove '{}' from storage: {}", key, e);
        }
    }
}

/// Restore the session from `storage`.
///
/// `loading` is true for the duration and false on every exit path. Afterwards
/// the store holds either the stored identity or a clean unauthenticated state.
pub async fn restore_session(store: &SessionStore, storage: &dyn DurableStorage, keys: &StorageKeys) -> RestoreOutcome {
    let _loading = LoadingGuard::start(store);
    match read_stored(storage, keys) {
        Ok(Some((identity, credential))) => {
            info!(target: "bridge", "restored session user={} role={}", identity.id, identity.role);
            store.set_credentials(identity, credential);
            RestoreOutcome::Restored
        }
        Ok(None) => RestoreOutcome::Absent,
        Err(e) => {
            warn!(target: "bridge", "discarding stored session: {}", e);
            discard(storage, keys);
            store.clear();
            RestoreOutcome::Discarded
        }
    }
}

/// Runs [`restore_session`] at most once per instance.
pub struct Bridge {
    store: SessionStore,
    storage: Arc<dyn DurableStorage>,
    keys: StorageKeys,
    mounted: AtomicBool,
}

impl Bridge {
    pub fn new(store: SessionStore, storage: Arc<dyn DurableStorage>, keys: StorageKeys) -> Self {
        Self { store, storage, keys, mounted: AtomicBool::new(false) }
    }

    pub fn is_mounted(&self) -> bool { self.mounted.load(Ordering::SeqCst) }

    /// Spawn the restore on the current tokio runtime. Returns `None` when the
    /// bridge has already been mounted.
    pub fn mount(&self) -> Option<JoinHandle<RestoreOutcome>> {
        if self.mounted.swap(true, Ordering::SeqCst) {
            return None;
        }
        let store = self.store.clone();
        let storage = Arc::clone(&self.storage);
        let keys = self.keys.clone();
        Some(tokio::spawn(async move { restore_session(&store, storage.as_ref(), &keys).await }))
    }
}
