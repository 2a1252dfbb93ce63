use serde::Serialize;
use tracing::debug;

use super::guards::{GuardOutcome, ProtectedGuard, PublicGuard, RouteGuard};
use super::{normalize_path, GuardPolicy, Layout, NavigationRequest, Navigator, RouteDecision, View};
use crate::error::{AppError, AppResult};
use crate::identity::SessionState;

pub const ROOT_PATH: &str = "/";
pub const REGISTER_PATH: &str = "/register";

// Upper bound on redirects followed by `settle`.
const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDef {
    pub path: String,
    pub view: View,
}

impl RouteDef {
    fn new(path: impl Into<String>, view: View) -> Self { Self { path: path.into(), view } }
}

/// Protected group, rendered inside the authenticated layout.
pub fn protected_routes() -> Vec<RouteDef> {
    vec![
        RouteDef::new("/dashboard", View::Dashboard),
        RouteDef::new("/incidents", View::Incidents),
        RouteDef::new("/personnel", View::Personnel),
        RouteDef::new("/my-tasks", View::MyTasks),
        RouteDef::new("/users", View::Users),
        RouteDef::new("/tickets", View::Tickets),
        RouteDef::new("/help-desk", View::HelpDesk),
        RouteDef::new("/announcements", View::Announcements),
        RouteDef::new("/analytics", View::Analytics),
        RouteDef::new("/profile", View::Profile),
    ]
}

/// Final outcome of a navigation after following redirects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settled {
    pub requested: String,
    pub path: String,
    pub view: View,
    pub layout: Layout,
    pub redirects: Vec<NavigationRequest>,
}

/// Path → view table. `/` and unknown paths go to login; the public group sits
/// behind [`PublicGuard`]; the protected group is checked once by
/// [`ProtectedGuard`] and shares the authenticated layout.
#[derive(Debug, Clone)]
pub struct RouteTable {
    public: Vec<RouteDef>,
    protected: Vec<RouteDef>,
    public_guard: PublicGuard,
    protected_guard: ProtectedGuard,
    login_path: String,
    landing_path: String,
}

impl RouteTable {
    pub fn new(login_path: &str, landing_path: &str, policy: GuardPolicy) -> AppResult<Self> {
        let login_path = normalize_path(login_path);
        let landing_path = normalize_path(landing_path);
        let protected = protected_routes();
        if login_path == ROOT_PATH || login_path == REGISTER_PATH || protected.iter().any(|r| r.path == login_path) {
            return Err(AppError::config("bad_login_path".to_string(), format!("login path '{}' collides with another route", login_path)));
        }
        if !protected.iter().any(|r| r.path == landing_path) {
            return Err(AppError::config("bad_landing_path".to_string(), format!("landing path '{}' is not a protected route", landing_path)));
        }
        Ok(Self {
            public: vec![RouteDef::new(login_path.clone(), View::Login), RouteDef::new(REGISTER_PATH, View::Register)],
            protected,
            public_guard: PublicGuard::new(landing_path.clone()),
            protected_guard: ProtectedGuard::new(login_path.clone(), policy),
            login_path,
            landing_path,
        })
    }

    pub fn login_path(&self) -> &str { &self.login_path }

    pub fn landing_path(&self) -> &str { &self.landing_path }

    pub fn policy(&self) -> GuardPolicy { self.protected_guard.policy() }

    pub fn public_routes(&self) -> &[RouteDef] { &self.public }

    pub fn protected_routes(&self) -> &[RouteDef] { &self.protected }

    fn to_login(&self) -> RouteDecision { RouteDecision::Redirect(NavigationRequest::replace(self.login_path.clone())) }

    /// One decision for `path` under `state`.
    pub fn resolve(&self, path: &str, state: &SessionState) -> RouteDecision {
        let path = normalize_path(path);
        if path == ROOT_PATH {
            return self.to_login();
        }
        if let Some(def) = self.public.iter().find(|r| r.path == path) {
            return match self.public_guard.check(state, &path) {
                GuardOutcome::Pass => RouteDecision::Render { view: def.view, layout: Layout::Bare },
                GuardOutcome::Redirect(r) => RouteDecision::Redirect(r),
                GuardOutcome::Deny => RouteDecision::Render { view: View::NotAuthorized, layout: Layout::Bare },
            };
        }
        if let Some(def) = self.protected.iter().find(|r| r.path == path) {
            return match self.protected_guard.check(state, &path) {
                GuardOutcome::Pass => RouteDecision::Render { view: def.view, layout: Layout::Authenticated },
                GuardOutcome::Redirect(r) => RouteDecision::Redirect(r),
                GuardOutcome::Deny => RouteDecision::Render { view: View::NotAuthorized, layout: Layout::Authenticated },
            };
        }
        debug!(target: "routing", "no route for {}, falling back to login", path);
        self.to_login()
    }

    /// Follow redirects from `path` until a view renders.
    pub fn settle(&self, path: &str, state: &SessionState) -> AppResult<Settled> {
        let requested = normalize_path(path);
        let mut current = requested.clone();
        let mut redirects = Vec::new();
        loop {
            match self.resolve(&current, state) {
                RouteDecision::Render { view, layout } => {
                    return Ok(Settled { requested, path: current, view, layout, redirects });
                }
                RouteDecision::Redirect(r) => {
                    if redirects.len() >= MAX_REDIRECTS {
                        return Err(AppError::internal("redirect_loop".to_string(), format!("too many redirects from '{}'", requested)));
                    }
                    current = normalize_path(&r.path);
                    redirects.push(r);
                }
            }
        }
    }

    /// Push `path` on the navigator, then issue every redirect it settles through.
    pub fn navigate_with(&self, navigator: &mut dyn Navigator, path: &str, state: &SessionState) -> AppResult<Settled> {
        let settled = self.settle(path, state)?;
        navigator.navigate(NavigationRequest::push(settled.requested.clone()));
        for r in &settled.redirects {
            navigator.navigate(r.clone());
        }
        Ok(settled)
    }
}
