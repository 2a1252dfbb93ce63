//!
//! Routing decisions
//! -----------------
//! This module decides where a navigation request ends up; it does not render
//! anything and does not own the router. The router is reached through the
//! [`Navigator`] trait, which receives "go to path, maybe replacing history"
//! requests.
//!
//! - [`guards`]: public-only and protected guards.
//! - [`table`]: the static path → view table composed with the guards.

use serde::{Deserialize, Serialize};

pub mod guards;
pub mod table;

pub use guards::{GuardOutcome, ProtectedGuard, PublicGuard, RouteGuard};
pub use table::{RouteDef, RouteTable, Settled};

/// Destinations known to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    Login,
    Register,
    Dashboard,
    Incidents,
    Personnel,
    MyTasks,
    Users,
    Tickets,
    HelpDesk,
    Announcements,
    Analytics,
    Profile,
    NotAuthorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Public pages, no chrome.
    Bare,
    /// Shared dashboard layout (sidebar menu, header).
    Authenticated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationRequest {
    pub path: String,
    /// Replace the current history entry instead of pushing a new one.
    pub replace: bool,
}

impl NavigationRequest {
    pub fn push(path: impl Into<String>) -> Self { Self { path: path.into(), replace: false } }
    pub fn replace(path: impl Into<String>) -> Self { Self { path: path.into(), replace: true } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteDecision {
    Render { view: View, layout: Layout },
    Redirect(NavigationRequest),
}

/// How much the protected guard checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardPolicy {
    /// Any authenticated identity may open any protected path. Per-role
    /// permission is left to the backend on each data operation.
    #[default]
    AuthenticatedOnly,
    /// Protected paths with a menu entry also require the identity's role to
    /// be listed on that entry; otherwise the not-authorized view renders.
    EnforceRoles,
}

/// The router side of navigation.
pub trait Navigator {
    fn navigate(&mut self, request: NavigationRequest);
}

/// In-memory history stack; the last entry is the current location.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<String>,
}

impl History {
    pub fn new() -> Self { Self::default() }

    pub fn current(&self) -> Option<&str> { self.entries.last().map(String::as_str) }

    pub fn entries(&self) -> &[String] { &self.entries }

    /// Pop the current entry; returns the new current location.
    pub fn back(&mut self) -> Option<&str> {
        if self.entries.len() > 1 { self.entries.pop(); }
        self.current()
    }
}

impl Navigator for History {
    fn navigate(&mut self, request: NavigationRequest) {
        if request.replace {
            self.entries.pop();
        }
        self.entries.push(request.path);
    }
}

/// Strip query and fragment, drop a trailing slash; empty becomes "/".
pub fn normalize_path(path: &str) -> String {
    let end = path.find(|c| c == '?' || c == '#').unwrap_or(path.len());
    let p = path[..end].trim();
    let p = p.trim_end_matches('/');
    if p.is_empty() { return "/".to_string(); }
    if p.starts_with('/') { p.to_string() } else { format!("/{}", p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("/users/"), "/users");
        assert_eq!(normalize_path("/users?page=2"), "/users");
        assert_eq!(normalize_path("/help-desk#faq"), "/help-desk");
        assert_eq!(normalize_path("dashboard"), "/dashboard");
    }

    #[test]
    fn history_replace_and_back() {
        let mut h = History::new();
        h.navigate(NavigationRequest::push("/dashboard"));
        h.navigate(NavigationRequest::push("/login"));
        h.navigate(NavigationRequest::replace("/dashboard"));
        assert_eq!(h.entries(), &["/dashboard".to_string(), "/dashboard".to_string()]);
        assert_eq!(h.back(), Some("/dashboard"));
        // never pops the last entry
        assert_eq!(h.back(), Some("/dashboard"));
    }

    #[test]
    fn decision_serializes_with_kind() {
        let v = serde_json::to_value(RouteDecision::Render { view: View::MyTasks, layout: Layout::Authenticated }).unwrap();
        assert_eq!(v["kind"], "render");
        assert_eq!(v["view"], "my-tasks");
        let v = serde_json::to_value(RouteDecision::Redirect(NavigationRequest::replace("/login"))).unwrap();
        assert_eq!(v["kind"], "redirect");
        assert_eq!(v["path"], "/login");
        assert_eq!(v["replace"], true);
    }
}
