//! Role-filtered navigation menu.
//!
//! The menu is a fixed, ordered table. Each entry names the roles allowed to
//! see it, or `None` for every role. Filtering removes entries and never
//! reorders what is left.

use serde::Serialize;

use crate::identity::{Identity, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    pub icon: &'static str,
    pub label: &'static str,
    pub path: &'static str,
    pub allowed_roles: Option<&'static [Role]>,
}

impl NavEntry {
    pub fn allows(&self, role: Role) -> bool {
        match self.allowed_roles {
            None => true,
            Some(roles) => roles.contains(&role),
        }
    }

    /// Unrestricted entries are visible even without an identity.
    pub fn visible_to(&self, identity: Option<&Identity>) -> bool {
        match (self.allowed_roles, identity) {
            (None, _) => true,
            (Some(_), Some(id)) => self.allows(id.role),
            (Some(_), None) => false,
        }
    }
}

const EVERYONE: &[Role] = &[Role::Admin, Role::Staff, Role::Tanod, Role::Resident];
const OFFICE: &[Role] = &[Role::Admin, Role::Staff];

pub const MENU: &[NavEntry] = &[
    NavEntry { icon: "layout-dashboard", label: "Dashboard", path: "/dashboard", allowed_roles: Some(EVERYONE) },
    NavEntry { icon: "alert-triangle", label: "Incident Reports", path: "/incidents", allowed_roles: Some(&[Role::Admin, Role::Staff, Role::Resident]) },
    NavEntry { icon: "shield", label: "Tanod Management", path: "/personnel", allowed_roles: Some(OFFICE) },
    NavEntry { icon: "clipboard-check", label: "My Tasks", path: "/my-tasks", allowed_roles: Some(&[Role::Tanod]) },
    NavEntry { icon: "users", label: "User Management", path: "/users", allowed_roles: Some(&[Role::Admin]) },
    NavEntry { icon: "ticket", label: "Help Desk Tickets", path: "/tickets", allowed_roles: Some(OFFICE) },
    NavEntry { icon: "bot", label: "AI Help Desk", path: "/help-desk", allowed_roles: Some(EVERYONE) },
    NavEntry { icon: "megaphone", label: "Announcements", path: "/announcements", allowed_roles: Some(EVERYONE) },
    NavEntry { icon: "bar-chart", label: "Analytics", path: "/analytics", allowed_roles: Some(OFFICE) },
];

pub fn visible_entries_in<'a>(table: &'a [NavEntry], identity: Option<&Identity>) -> Vec<&'a NavEntry> {
    table.iter().filter(|e| e.visible_to(identity)).collect()
}

pub fn visible_entries(identity: Option<&Identity>) -> Vec<&'static NavEntry> {
    visible_entries_in(MENU, identity)
}

pub fn entry_for_path(path: &str) -> Option<&'static NavEntry> {
    MENU.iter().find(|e| e.path == path)
}

/// Roles permitted at `path`; `None` when the path has no menu entry or the
/// entry is unrestricted.
pub fn roles_for_path(path: &str) -> Option<&'static [Role]> {
    entry_for_path(path).and_then(|e| e.allowed_roles)
}
