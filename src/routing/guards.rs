use tracing::debug;

use super::{GuardPolicy, NavigationRequest};
use crate::identity::SessionState;
use crate::navigation;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Render the wrapped view(s).
    Pass,
    /// Send the visitor elsewhere.
    Redirect(NavigationRequest),
    /// Authenticated but the role is not allowed at this path.
    Deny,
}

/// Synchronous decision taken before a wrapped view renders.
pub trait RouteGuard: Send + Sync {
    fn check(&self, state: &SessionState, path: &str) -> GuardOutcome;
}

/// Wraps login/registration: authenticated visitors go to the landing page.
#[derive(Debug, Clone)]
pub struct PublicGuard {
    landing_path: String,
}

impl PublicGuard {
    pub fn new(landing_path: impl Into<String>) -> Self { Self { landing_path: landing_path.into() } }
}

impl RouteGuard for PublicGuard {
    fn check(&self, state: &SessionState, path: &str) -> GuardOutcome {
        if state.is_authenticated() {
            debug!(target: "routing", "public guard: {} -> {}", path, self.landing_path);
            return GuardOutcome::Redirect(NavigationRequest::replace(self.landing_path.clone()));
        }
        GuardOutcome::Pass
    }
}

/// Wraps the authenticated group: anonymous visitors go to login.
#[derive(Debug, Clone)]
pub struct ProtectedGuard {
    login_path: String,
    policy: GuardPolicy,
}

impl ProtectedGuard {
    pub fn new(login_path: impl Into<String>, policy: GuardPolicy) -> Self {
        Self { login_path: login_path.into(), policy }
    }

    pub fn policy(&self) -> GuardPolicy { self.policy }
}

impl RouteGuard for ProtectedGuard {
    fn check(&self, state: &SessionState, path: &str) -> GuardOutcome {
        let Some(identity) = state.identity.as_ref() else {
            debug!(target: "routing", "protected guard: {} -> {}", path, self.login_path);
            return GuardOutcome::Redirect(NavigationRequest::replace(self.login_path.clone()));
        };
        if self.policy == GuardPolicy::EnforceRoles {
            if let Some(roles) = navigation::roles_for_path(path) {
                if !roles.contains(&identity.role) {
                    debug!(target: "routing", "protected guard: role {} denied at {}", identity.role, path);
                    return GuardOutcome::Deny;
                }
            }
        }
        GuardOutcome::Pass
    }
}
