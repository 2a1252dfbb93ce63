//! Configuration: defaults, then an optional JSON file named by
//! `BARANGAY_CONFIG`, then individual environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::routing::GuardPolicy;
use crate::storage::StorageKeys;

pub const ENV_CONFIG: &str = "BARANGAY_CONFIG";
pub const ENV_STORAGE: &str = "BARANGAY_STORAGE";
pub const ENV_TOKEN_KEY: &str = "BARANGAY_TOKEN_KEY";
pub const ENV_IDENTITY_KEY: &str = "BARANGAY_IDENTITY_KEY";
pub const ENV_ENFORCE_ROLES: &str = "BARANGAY_ENFORCE_ROLES";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    /// File backing durable storage; `None` keeps storage in memory.
    pub storage_path: Option<PathBuf>,
    pub keys: StorageKeys,
    pub login_path: String,
    pub landing_path: String,
    pub guard_policy: GuardPolicy,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            storage_path: Some(PathBuf::from(".barangay").join("storage.json")),
            keys: StorageKeys::default(),
            login_path: "/login".to_string(),
            landing_path: "/dashboard".to_string(),
            guard_policy: GuardPolicy::AuthenticatedOnly,
        }
    }
}

pub fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl AccessConfig {
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::config("config_unreadable".to_string(), format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| AppError::config("config_invalid".to_string(), format!("{}: {}", path.display(), e)))
    }

    /// Build from the process environment.
    pub fn from_env() -> AppResult<Self> { Self::from_lookup(|k| std::env::var(k).ok()) }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let mut cfg = match lookup(ENV_CONFIG) {
            Some(p) if !p.trim().is_empty() => Self::from_file(Path::new(p.trim()))?,
            _ => Self::default(),
        };
        if let Some(p) = lookup(ENV_STORAGE) {
            let p = p.trim();
            cfg.storage_path = match p {
                "" | ":memory:" => None,
                _ => Some(PathBuf::from(p)),
            };
        }
        if let Some(k) = lookup(ENV_TOKEN_KEY).filter(|k| !k.is_empty()) { cfg.keys.token = k; }
        if let Some(k) = lookup(ENV_IDENTITY_KEY).filter(|k| !k.is_empty()) { cfg.keys.identity = k; }
        if let Some(v) = lookup(ENV_ENFORCE_ROLES) {
            let on = parse_bool(&v)
                .ok_or_else(|| AppError::config("bad_env".to_string(), format!("{}: not a boolean: '{}'", ENV_ENFORCE_ROLES, v)))?;
            cfg.guard_policy = if on { GuardPolicy::EnforceRoles } else { GuardPolicy::AuthenticatedOnly };
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.keys.token == self.keys.identity {
            return Err(AppError::config("bad_keys".to_string(), format!("token and identity share the key '{}'", self.keys.token)));
        }
        Ok(())
    }
}
