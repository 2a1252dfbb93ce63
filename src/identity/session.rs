use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::tprintln;

use super::principal::{Credential, Identity};

/// Snapshot of the session. `authenticated` is derived, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub identity: Option<Identity>,
    pub credential: Option<Credential>,
    pub loading: bool,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool { self.identity.is_some() }
}

/// Process-wide holder of the current session.
///
/// Cloning yields another handle to the same state; hand it to guards,
/// navigation and the persistence bridge explicitly. Mutation goes only through
/// [`set_credentials`](Self::set_credentials), [`clear`](Self::clear) and
/// [`set_loading`](Self::set_loading). The store never touches durable storage.
#[derive(Clone)]
pub struct SessionStore {
    tx: Arc<watch::Sender<SessionState>>,
}

impl Default for SessionStore {
    fn default() -> Self { Self::new() }
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn state(&self) -> SessionState { self.tx.borrow().clone() }

    pub fn is_authenticated(&self) -> bool { self.tx.borrow().is_authenticated() }

    pub fn is_loading(&self) -> bool { self.tx.borrow().loading }

    /// Receiver that observes every effective mutation.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> { self.tx.subscribe() }

    /// Replace identity and credential; `loading` is left as is. No validation.
    pub fn set_credentials(&self, identity: Identity, credential: Credential) {
        debug!(target: "session", "set_credentials user={} role={}", identity.id, identity.role);
        tprintln!("session.set user={} role={}", identity.id, identity.role);
        self.tx.send_modify(|s| {
            s.identity = Some(identity);
            s.credential = Some(credential);
        });
    }

    pub fn clear(&self) {
        let changed = self.tx.send_if_modified(|s| {
            let had = s.identity.is_some() || s.credential.is_some();
            s.identity = None;
            s.credential = None;
            had
        });
        if changed {
            debug!(target: "session", "cleared");
        }
    }

    pub fn set_loading(&self, loading: bool) {
        self.tx.send_if_modified(|s| {
            let changed = s.loading != loading;
            s.loading = loading;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Role;

    fn admin() -> Identity { Identity::new("u1", "a@b.com", Role::Admin) }

    #[test]
    fn starts_unauthenticated_and_idle() {
        let store = SessionStore::new();
        let s = store.state();
        assert!(s.identity.is_none());
        assert!(s.credential.is_none());
        assert!(!s.loading);
        assert!(!s.is_authenticated());
    }

    #[test]
    fn set_credentials_does_not_touch_loading() {
        let store = SessionStore::new();
        store.set_loading(true);
        store.set_credentials(admin(), Credential::new("tok-1"));
        let s = store.state();
        assert!(s.loading);
        assert!(s.is_authenticated());
        assert_eq!(s.credential.as_ref().map(|c| c.as_str()), Some("tok-1"));
    }

    #[test]
    fn clear_drops_identity_and_credential_only() {
        let store = SessionStore::new();
        store.set_credentials(admin(), Credential::new("tok-1"));
        store.set_loading(true);
        store.clear();
        let s = store.state();
        assert!(!s.is_authenticated());
        assert!(s.credential.is_none());
        assert!(s.loading);
    }

    #[test]
    fn set_credentials_replaces_unconditionally() {
        let store = SessionStore::new();
        store.set_credentials(admin(), Credential::new("tok-1"));
        store.set_credentials(Identity::new("u9", "t@b.com", Role::Tanod), Credential::new("tok-9"));
        let s = store.state();
        assert_eq!(s.identity.unwrap().role, Role::Tanod);
        assert_eq!(s.credential.unwrap().as_str(), "tok-9");
    }

    #[test]
    fn clones_share_state() {
        let a = SessionStore::new();
        let b = a.clone();
        a.set_credentials(admin(), Credential::new("t"));
        assert!(b.is_authenticated());
    }

    #[tokio::test]
    async fn subscribers_see_mutations() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();
        store.set_credentials(admin(), Credential::new("t"));
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_authenticated());

        store.clear();
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().is_authenticated());
        // already cleared: no notification
        store.clear();
        assert!(!rx.has_changed().unwrap());
    }
}
