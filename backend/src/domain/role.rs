//! Access tiers recognised by the dashboard.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Identity;

/// Normalised role carried in an identity's profile metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Vendor,
    Customer,
}

/// Returned when a string names no known role.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    /// Canonical lowercase name, as stored in profile metadata.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Vendor => "vendor",
            Self::Customer => "customer",
        }
    }

    /// Whether this role may enter the protected dashboard.
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    /// Exact, case-sensitive match against the canonical names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "vendor" => Ok(Self::Vendor),
            "customer" => Ok(Self::Customer),
            other => Err(UnknownRole(other.to_owned())),
        }
    }
}

/// Read the role from an identity's profile metadata.
///
/// Missing identities, missing metadata, non-string values, and
/// unrecognised strings all resolve to `None`. Matching is exact.
///
/// # Examples
/// ```
/// use marketplace_gateway::domain::{Identity, Role, UserId, resolve_role};
/// use serde_json::json;
///
/// let id = UserId::new("7b0c7d8e-2a55-4f77-8d3b-6f4c1f0f9a10").unwrap();
/// let admin = Identity::new(id.clone(), None, json!({ "role": "admin" }));
/// assert_eq!(resolve_role(Some(&admin)), Some(Role::Admin));
///
/// let shouty = Identity::new(id, None, json!({ "role": "ADMIN" }));
/// assert_eq!(resolve_role(Some(&shouty)), None);
/// assert_eq!(resolve_role(None), None);
/// ```
pub fn resolve_role(identity: Option<&Identity>) -> Option<Role> {
    identity?
        .metadata()
        .get("role")?
        .as_str()?
        .parse()
        .ok()
}
