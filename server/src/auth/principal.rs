//! Verified caller identity.
//!
//! # Invariants
//! - A `Principal` is only ever built from a token that passed signature and
//!   expiry verification; it is never read from any other request field.
//! - A `Principal` lives for exactly one request and is never persisted.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Coarse role carried in the `role` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Standard user; may only act on resources assigned to them.
    User,
    /// Administrator; bypasses ownership checks.
    Admin,
}

impl Role {
    /// The wire name used in tokens and JSON bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known role name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// The verified identity attached to one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    /// Numeric user id taken from the `uid` claim.
    pub subject_id: i64,
    /// Role taken from the `role` claim.
    pub role: Role,
}

impl Principal {
    #[must_use]
    pub const fn new(subject_id: i64, role: Role) -> Self {
        Self { subject_id, role }
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}
