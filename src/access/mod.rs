// Access level model and permission evaluation
//
// Two scales live here and they are deliberately separate types:
// - AccessLevel: account tiers, checked by the dispatcher on every request
// - TenurePrivilege: a keeper's privilege on a single forest, checked by handlers

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::DispatchError;

/// Account tier. Larger is more privileged.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum AccessLevel {
    #[default]
    All = 0,
    Keeper = 1,
    #[serde(alias = "link")]
    Support = 2,
    #[serde(alias = "whitelist")]
    Root = 3,
    System = 4,
}

impl AccessLevel {
    /// Forest-sharing alias for `Support`
    pub const LINK: AccessLevel = AccessLevel::Support;
    /// Forest-sharing alias for `Root`
    pub const WHITELIST: AccessLevel = AccessLevel::Root;

    pub const ALL_LEVELS: [AccessLevel; 5] = [
        AccessLevel::All,
        AccessLevel::Keeper,
        AccessLevel::Support,
        AccessLevel::Root,
        AccessLevel::System,
    ];

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn from_level(level: u8) -> Option<Self> {
        Self::ALL_LEVELS.into_iter().find(|l| l.level() == level)
    }

    pub fn name(self) -> &'static str {
        match self {
            AccessLevel::All => "all",
            AccessLevel::Keeper => "keeper",
            AccessLevel::Support => "support",
            AccessLevel::Root => "root",
            AccessLevel::System => "system",
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name(), self.level())
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(level) = s.parse::<u8>() {
            return Self::from_level(level).ok_or_else(|| format!("unknown access level {}", level));
        }

        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(AccessLevel::All),
            "keeper" => Ok(AccessLevel::Keeper),
            "support" | "link" => Ok(AccessLevel::Support),
            "root" | "whitelist" => Ok(AccessLevel::Root),
            "system" => Ok(AccessLevel::System),
            other => Err(format!("unknown access level '{}'", other)),
        }
    }
}

/// Privilege a keeper holds on one forest (a tenure)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TenurePrivilege {
    /// No access at all
    #[default]
    Poacher = 0,
    /// Read only
    Watcher = 1,
    /// Read only, may suggest edits
    Surveyor = 2,
    /// Editor
    Tenant = 3,
    /// Full privileges over the forest
    Landowner = 4,
}

impl TenurePrivilege {
    pub const ALL_PRIVILEGES: [TenurePrivilege; 5] = [
        TenurePrivilege::Poacher,
        TenurePrivilege::Watcher,
        TenurePrivilege::Surveyor,
        TenurePrivilege::Tenant,
        TenurePrivilege::Landowner,
    ];

    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            TenurePrivilege::Poacher => "poacher",
            TenurePrivilege::Watcher => "watcher",
            TenurePrivilege::Surveyor => "surveyor",
            TenurePrivilege::Tenant => "tenant",
            TenurePrivilege::Landowner => "landowner",
        }
    }

    /// True when this privilege is at least `required`
    pub fn permits(self, required: TenurePrivilege) -> bool {
        self >= required
    }
}

impl FromStr for TenurePrivilege {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL_PRIVILEGES
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s) || s.parse::<u8>().ok() == Some(p.level()))
            .ok_or_else(|| format!("unknown tenure privilege '{}'", s))
    }
}

/// Identity attached to a request by the authentication layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedUser {
    pub id: String,
    pub username: String,
    pub access_level: AccessLevel,
}

/// Why a request was turned away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No identity and the resource is not public
    Unauthenticated,
    /// Identity present but below the required level
    InsufficientPrivilege,
}

/// Module level acts as a floor; the stricter of the two always wins
pub fn effective_level(module_level: AccessLevel, handler_level: AccessLevel) -> AccessLevel {
    module_level.max(handler_level)
}

/// Decide whether `user` may reach a resource guarded by `required`.
/// Anonymous callers are only denied when the resource is above `All`.
pub fn access_denied(user: Option<&AuthorizedUser>, required: AccessLevel) -> Option<Denial> {
    match user {
        None if required > AccessLevel::All => Some(Denial::Unauthenticated),
        Some(user) if user.access_level < required => Some(Denial::InsufficientPrivilege),
        _ => None,
    }
}

pub fn check_permissions(
    user: Option<&AuthorizedUser>,
    required: AccessLevel,
) -> Result<(), DispatchError> {
    match access_denied(user, required) {
        None => Ok(()),
        Some(Denial::Unauthenticated) => {
            tracing::warn!("Anonymous request denied, requires {}", required);
            Err(DispatchError::Unauthorized)
        }
        Some(Denial::InsufficientPrivilege) => {
            if let Some(user) = user {
                tracing::warn!(
                    "User '{}' with {} denied, requires {}",
                    user.username,
                    user.access_level,
                    required
                );
            }
            Err(DispatchError::Forbidden)
        }
    }
}
