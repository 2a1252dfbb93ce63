//! Access-layer integration tests: restore from file-backed storage, guard
//! decisions through the route table, and role-filtered menus.

use std::sync::Arc;

use anyhow::Result;
use tempfile::tempdir;

use barangay_access::bridge::{restore_session, RestoreOutcome, SessionPersister};
use barangay_access::identity::{Credential, Identity, Role, SessionState, SessionStore};
use barangay_access::navigation::{visible_entries, visible_entries_in, NavEntry};
use barangay_access::routing::{GuardPolicy, History, Layout, NavigationRequest, RouteDecision, View};
use barangay_access::storage::{DurableStorage, FileStorage, StorageKeys};
use barangay_access::{AccessApp, AccessConfig};

fn state_for(role: Role) -> SessionState {
    SessionState {
        identity: Some(Identity::new("u1", "a@b.com", role)),
        credential: Some(Credential::new("tok-1")),
        loading: false,
    }
}

fn file_config(path: std::path::PathBuf) -> AccessConfig {
    AccessConfig { storage_path: Some(path), ..AccessConfig::default() }
}

#[tokio::test]
async fn restore_from_empty_file_is_idempotent() -> Result<()> {
    let tmp = tempdir()?;
    let storage = FileStorage::new(tmp.path().join("storage.json"));
    let store = SessionStore::new();
    for _ in 0..3 {
        let out = restore_session(&store, &storage, &StorageKeys::default()).await;
        assert_eq!(out, RestoreOutcome::Absent);
        let s = store.state();
        assert!(s.identity.is_none());
        assert!(!s.is_authenticated());
        assert!(!s.loading);
    }
    Ok(())
}

#[tokio::test]
async fn restore_valid_admin_from_file() -> Result<()> {
    let tmp = tempdir()?;
    let path = tmp.path().join("storage.json");
    let storage = FileStorage::new(&path);
    storage.set("token", "tok-1")?;
    storage.set("user", r#"{"id":"u1","email":"a@b.com","role":"admin"}"#)?;

    let app = AccessApp::new(file_config(path))?;
    let outcome = app.mount().expect("first mount").await?;
    assert_eq!(outcome, RestoreOutcome::Restored);
    let s = app.state();
    assert_eq!(s.identity.as_ref().map(|i| i.role), Some(Role::Admin));
    assert!(s.is_authenticated());
    assert!(!s.loading);
    Ok(())
}

#[tokio::test]
async fn corrupted_identity_is_removed_from_file() -> Result<()> {
    let tmp = tempdir()?;
    let path = tmp.path().join("storage.json");
    let storage = FileStorage::new(&path);
    storage.set("token", "tok-1")?;
    storage.set("user", "{not json")?;

    let app = AccessApp::new(file_config(path.clone()))?;
    assert_eq!(app.mount().expect("first mount").await?, RestoreOutcome::Discarded);

    let reread = FileStorage::new(&path);
    assert_eq!(reread.get("token")?, None);
    assert_eq!(reread.get("user")?, None);
    let s = app.state();
    assert!(s.identity.is_none());
    assert!(!s.is_authenticated());
    assert!(!s.loading);
    Ok(())
}

#[test]
fn public_guard_through_route_table() -> Result<()> {
    let app = AccessApp::new(AccessConfig { storage_path: None, ..AccessConfig::default() })?;
    let routes = app.routes();
    for role in Role::ALL {
        assert_eq!(
            routes.resolve("/login", &state_for(role)),
            RouteDecision::Redirect(NavigationRequest::replace("/dashboard"))
        );
    }
    assert_eq!(
        routes.resolve("/login", &SessionState::default()),
        RouteDecision::Render { view: View::Login, layout: Layout::Bare }
    );
    Ok(())
}

#[test]
fn protected_guard_through_route_table() -> Result<()> {
    let app = AccessApp::new(AccessConfig { storage_path: None, ..AccessConfig::default() })?;
    let routes = app.routes();
    for def in routes.protected_routes() {
        assert_eq!(
            routes.resolve(&def.path, &SessionState::default()),
            RouteDecision::Redirect(NavigationRequest::replace("/login"))
        );
        assert_eq!(
            routes.resolve(&def.path, &state_for(Role::Resident)),
            RouteDecision::Render { view: def.view, layout: Layout::Authenticated }
        );
    }
    Ok(())
}

#[test]
fn tanod_menu_matches_allowed_entries() {
    let tanod = Identity::new("t1", "t@b.com", Role::Tanod);
    let labels: Vec<&str> = visible_entries(Some(&tanod)).iter().map(|e| e.label).collect();
    assert_eq!(labels, vec!["Dashboard", "My Tasks", "AI Help Desk", "Announcements"]);
    assert!(!labels.contains(&"User Management"));
}

#[test]
fn unrestricted_entry_visible_to_everyone() {
    let table = [
        NavEntry { icon: "home", label: "Home", path: "/home", allowed_roles: None },
        NavEntry { icon: "users", label: "User Management", path: "/users", allowed_roles: Some(&[Role::Admin]) },
    ];
    for role in Role::ALL {
        let id = Identity::new("x", "x@y.z", role);
        assert_eq!(visible_entries_in(&table, Some(&id))[0].label, "Home");
    }
    let anon = visible_entries_in(&table, None);
    assert_eq!(anon.len(), 1);
    assert_eq!(anon[0].label, "Home");
}

#[tokio::test]
async fn persister_round_trips_through_next_startup() -> Result<()> {
    let tmp = tempdir()?;
    let path = tmp.path().join("storage.json");

    // first run: log in, the persister writes storage
    {
        let storage: Arc<dyn DurableStorage> = Arc::new(FileStorage::new(&path));
        let store = SessionStore::new();
        let persister = SessionPersister::new(Arc::clone(&storage), StorageKeys::default());
        let mut id = Identity::new("u7", "s@b.com", Role::Staff);
        id.first_name = Some("Ana".into());
        store.set_credentials(id, Credential::new("tok-7"));
        persister.apply(&store.state())?;
    }

    // second run: the bridge restores it
    let app = AccessApp::new(file_config(path))?;
    app.mount().expect("first mount").await?;
    let s = app.state();
    assert_eq!(s.identity.as_ref().map(|i| i.display_name()), Some("Ana".to_string()));
    assert_eq!(s.credential.as_ref().map(|c| c.as_str()), Some("tok-7"));

    let mut history = History::new();
    assert_eq!(app.navigate(&mut history, "/")?.view, View::Dashboard);
    assert_eq!(app.navigate(&mut history, "/personnel")?.view, View::Personnel);
    Ok(())
}

#[tokio::test]
async fn enforce_roles_blocks_direct_navigation() -> Result<()> {
    let tmp = tempdir()?;
    let path = tmp.path().join("storage.json");
    let storage = FileStorage::new(&path);
    storage.set("token", "tok-3")?;
    storage.set("user", r#"{"id":"t3","email":"t@b.com","role":"tanod"}"#)?;

    let cfg = AccessConfig { guard_policy: GuardPolicy::EnforceRoles, ..file_config(path) };
    let app = AccessApp::new(cfg)?;
    app.mount().expect("first mount").await?;
    assert_eq!(app.settle("/users")?.view, View::NotAuthorized);
    assert_eq!(app.settle("/help-desk")?.view, View::HelpDesk);
    assert_eq!(app.settle("/profile")?.view, View::Profile);
    Ok(())
}

async fn wait_for(mut cond: impl FnMut() -> bool) {
    for _ in 0..100 {
        if cond() { return; }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn spawned_persister_follows_login_and_logout_in_file() -> Result<()> {
    let tmp = tempdir()?;
    let path = tmp.path().join("storage.json");
    let storage: Arc<dyn DurableStorage> = Arc::new(FileStorage::new(&path));
    let store = SessionStore::new();
    let handle = SessionPersister::new(Arc::clone(&storage), StorageKeys::default()).spawn(&store);

    // login immediately after spawning, before the watcher has been polled
    store.set_credentials(Identity::new("u9", "k@b.com", Role::Tanod), Credential::new("tok-9"));
    let reread = FileStorage::new(&path);
    wait_for(|| matches!(reread.get("token"), Ok(Some(_)))).await;
    assert_eq!(reread.get("token")?.as_deref(), Some("tok-9"));
    let raw = reread.get("user")?.expect("identity written");
    assert_eq!(serde_json::from_str::<Identity>(&raw)?.role, Role::Tanod);

    store.clear();
    wait_for(|| matches!(reread.get("token"), Ok(None))).await;
    assert_eq!(reread.get("token")?, None);
    assert_eq!(reread.get("user")?, None);

    drop(store);
    handle.await?;
    Ok(())
}

#[tokio::test]
async fn corrupted_storage_file_is_replaced_and_login_persists_again() -> Result<()> {
    let tmp = tempdir()?;
    let path = tmp.path().join("storage.json");
    std::fs::write(&path, r#"{"token":"tok-1","user":"#)?;

    let app = AccessApp::new(file_config(path.clone()))?;
    assert_eq!(app.mount().expect("first mount").await?, RestoreOutcome::Discarded);
    assert!(!app.state().is_authenticated());

    let reread = FileStorage::new(&path);
    assert_eq!(reread.get("token")?, None);
    assert_eq!(reread.get("user")?, None);

    let id = Identity::new("u1", "a@b.com", Role::Admin);
    app.persister().persist_login(&id, &Credential::new("tok-2"))?;

    // next startup restores the new login
    let next = AccessApp::new(file_config(path))?;
    assert_eq!(next.mount().expect("first mount").await?, RestoreOutcome::Restored);
    assert_eq!(next.state().credential.as_ref().map(|c| c.as_str()), Some("tok-2"));
    Ok(())
}
