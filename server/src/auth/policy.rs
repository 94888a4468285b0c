//! Authorization decisions.
//!
//! Handlers call these guards at the top of each operation, after any
//! repository lookup the decision depends on. Every function here is total
//! and side-effect free apart from logging the denial reason.

use std::fmt;

use super::principal::{Principal, Role};

/// Why an authenticated (or anonymous) caller was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// No principal was attached to the request.
    NotAuthenticated,
    /// The caller's role is not among the roles the operation accepts.
    RoleMismatch,
    /// The resource has no owner, so only an admin may touch it.
    NotAssigned,
    /// The resource belongs to someone else.
    NotOwner,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated | Self::RoleMismatch => f.write_str("Access denied"),
            Self::NotAssigned => f.write_str("Resource is not assigned"),
            Self::NotOwner => f.write_str("Not your resource"),
        }
    }
}

/// Error returned by the access guards.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// The caller may not perform this operation on this resource.
    #[error("{0}")]
    Forbidden(DenialReason),
    /// The operation is refused regardless of privilege.
    #[error("{0}")]
    InvalidOperation(&'static str),
}

/// Require the principal to hold exactly `role`.
pub fn require_role(principal: Option<&Principal>, role: Role) -> Result<(), AccessError> {
    require_any_role(principal, &[role]).map(|_| ())
}

/// Require the principal to hold one of `roles`, returning it on success.
pub fn require_any_role<'a>(
    principal: Option<&'a Principal>,
    roles: &[Role],
) -> Result<&'a Principal, AccessError> {
    let Some(principal) = principal else {
        tracing::warn!("access denied: no principal (required={roles:?})");
        return Err(AccessError::Forbidden(DenialReason::NotAuthenticated));
    };
    if !roles.contains(&principal.role) {
        tracing::warn!(
            "access denied: role mismatch (userId={}, role={}, required={:?})",
            principal.subject_id,
            principal.role,
            roles
        );
        return Err(AccessError::Forbidden(DenialReason::RoleMismatch));
    }
    Ok(principal)
}

/// Allow admins unconditionally; otherwise require the caller to own the resource.
///
/// An unowned resource (`owner_id == None`) is denied to non-admins even for
/// reads.
pub fn require_owner_or_admin(
    principal: &Principal,
    owner_id: Option<i64>,
) -> Result<(), AccessError> {
    if principal.is_admin() {
        return Ok(());
    }
    match owner_id {
        None => {
            tracing::warn!(
                "access denied: resource is not assigned (userId={})",
                principal.subject_id
            );
            Err(AccessError::Forbidden(DenialReason::NotAssigned))
        }
        Some(owner) if owner != principal.subject_id => {
            tracing::warn!(
                "access denied: not your resource (userId={}, ownerId={})",
                principal.subject_id,
                owner
            );
            Err(AccessError::Forbidden(DenialReason::NotOwner))
        }
        Some(_) => Ok(()),
    }
}

/// Refuse operations where the caller targets their own account.
pub fn require_not_self(principal: &Principal, target_id: i64) -> Result<(), AccessError> {
    if principal.subject_id == target_id {
        tracing::warn!(
            "operation rejected: self-target (userId={})",
            principal.subject_id
        );
        return Err(AccessError::InvalidOperation("You can't delete yourself"));
    }
    Ok(())
}
