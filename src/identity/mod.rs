//! Identity and session state for the dashboard.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod role;
mod session;

pub use principal::{Credential, Identity};
pub use role::{ParseRoleError, Role};
pub use session::{SessionState, SessionStore};
