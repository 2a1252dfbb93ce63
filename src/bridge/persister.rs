use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::AppResult;
use crate::identity::{Credential, Identity, SessionState, SessionStore};
use crate::storage::{DurableStorage, StorageKeys};

/// Writes the session back to durable storage when it changes.
///
/// Login stores both entries, logout removes both. Loading-flag-only updates
/// and half-populated states are ignored.
#[derive(Clone)]
pub struct SessionPersister {
    storage: Arc<dyn DurableStorage>,
    keys: StorageKeys,
}

type Pair = (Option<Identity>, Option<Credential>);

fn pair_of(state: &SessionState) -> Pair { (state.identity.clone(), state.credential.clone()) }

impl SessionPersister {
    pub fn new(storage: Arc<dyn DurableStorage>, keys: StorageKeys) -> Self { Self { storage, keys } }

    pub fn persist_login(&self, identity: &Identity, credential: &Credential) -> AppResult<()> {
        let raw = serde_json::to_string(identity)?;
        self.storage.set(&self.keys.token, credential.as_str())?;
        self.storage.set(&self.keys.identity, &raw)?;
        debug!(target: "bridge", "persisted session user={}", identity.id);
        Ok(())
    }

    pub fn persist_logout(&self) -> AppResult<()> {
        self.storage.remove(&self.keys.token)?;
        self.storage.remove(&self.keys.identity)?;
        debug!(target: "bridge", "removed persisted session");
        Ok(())
    }

    pub fn apply(&self, state: &SessionState) -> AppResult<()> {
        match (&state.identity, &state.credential) {
            (Some(identity), Some(credential)) => self.persist_login(identity, credential),
            (None, None) => self.persist_logout(),
            _ => Ok(()),
        }
    }

    /// Follow `store` until every handle to it is dropped.
    pub fn spawn(self, store: &SessionStore) -> JoinHandle<()> {
        let mut rx = store.subscribe();
        // Baseline is taken before the task is scheduled; later changes are all written.
        let mut last = pair_of(&rx.borrow_and_update());
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                let current = pair_of(&state);
                if current == last { continue; }
                last = current;
                if let Err(e) = self.apply(&state) {
                    warn!(target: "bridge", "failed to persist session change: {}", e);
                }
            }
        })
    }
}
