//! Wiring of store, storage, bridge and route table for one application run.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use crate::bridge::{Bridge, RestoreOutcome, SessionPersister};
use crate::config::AccessConfig;
use crate::error::AppResult;
use crate::identity::{SessionState, SessionStore};
use crate::navigation::{self, NavEntry};
use crate::routing::{Navigator, RouteDecision, RouteTable, Settled};
use crate::storage::{DurableStorage, FileStorage, MemoryStorage};

pub struct AccessApp {
    config: AccessConfig,
    store: SessionStore,
    storage: Arc<dyn DurableStorage>,
    bridge: Bridge,
    routes: RouteTable,
    write_back: Mutex<Option<JoinHandle<()>>>,
}

impl AccessApp {
    /// Storage is chosen from `config.storage_path`.
    pub fn new(config: AccessConfig) -> AppResult<Self> {
        let storage: Arc<dyn DurableStorage> = match &config.storage_path {
            Some(p) => Arc::new(FileStorage::new(p)),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::with_storage(config, storage)
    }

    pub fn with_storage(config: AccessConfig, storage: Arc<dyn DurableStorage>) -> AppResult<Self> {
        config.validate()?;
        let routes = RouteTable::new(&config.login_path, &config.landing_path, config.guard_policy)?;
        let store = SessionStore::new();
        let bridge = Bridge::new(store.clone(), Arc::clone(&storage), config.keys.clone());
        Ok(Self { config, store, storage, bridge, routes, write_back: Mutex::new(None) })
    }

    pub fn config(&self) -> &AccessConfig { &self.config }

    pub fn store(&self) -> &SessionStore { &self.store }

    pub fn routes(&self) -> &RouteTable { &self.routes }

    pub fn persister(&self) -> SessionPersister {
        SessionPersister::new(Arc::clone(&self.storage), self.config.keys.clone())
    }

    /// Start the one-shot restore and the write-back watcher. Later calls
    /// return `None`.
    pub fn mount(&self) -> Option<JoinHandle<RestoreOutcome>> {
        if self.bridge.is_mounted() {
            return None;
        }
        {
            let mut slot = self.write_back.lock();
            if slot.is_none() {
                *slot = Some(self.persister().spawn(&self.store));
            }
        }
        let handle = self.bridge.mount();
        if handle.is_some() {
            info!(target: "startup", "restoring session (policy={:?})", self.routes.policy());
        }
        handle
    }

    pub fn state(&self) -> SessionState { self.store.state() }

    pub fn resolve(&self, path: &str) -> RouteDecision { self.routes.resolve(path, &self.store.state()) }

    pub fn settle(&self, path: &str) -> AppResult<Settled> { self.routes.settle(path, &self.store.state()) }

    pub fn navigate(&self, navigator: &mut dyn Navigator, path: &str) -> AppResult<Settled> {
        self.routes.navigate_with(navigator, path, &self.store.state())
    }

    pub fn menu(&self) -> Vec<&'static NavEntry> {
        let state = self.store.state();
        navigation::visible_entries(state.identity.as_ref())
    }
}

impl Drop for AccessApp {
    fn drop(&mut self) {
        if let Some(h) = self.write_back.lock().take() {
            h.abort();
        }
    }
}
