//! Permission evaluator
//!
//! The single authorization decision point. Everything here is a pure
//! function of its inputs; callers may cache results, never the evaluator.
//!
//! Two layers:
//! - [`check_permission`] / [`check_role`] surface caller misuse and unknown
//!   roles as errors.
//! - [`authorize`] / [`authorize_scoped`] apply the data-drift policy: an
//!   unknown role or a malformed stored key never grants access and never
//!   fails the request.

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::claims::Claims;
use crate::error::{Result, RolegateError};
use crate::permission::{decode, Permission, PermissionSet};
use crate::role::{is_at_least, Role};
use crate::scope::{in_scope, Scope};

/// Outcome of [`authorize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Allow,
    /// Ordinary denial: the user lacks the privilege
    Deny,
    /// Claims carry a role we do not recognize; sign out and back in
    Reauthenticate,
}

impl Decision {
    #[inline]
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

/// Effective set: a non-empty override replaces the role defaults entirely.
/// Malformed override keys are skipped.
pub fn effective_set<S: AsRef<str>>(role: Role, custom_permissions: &[S]) -> PermissionSet {
    if custom_permissions.is_empty() {
        return role.defaults();
    }
    let (set, rejected) = PermissionSet::parse_lenient(custom_permissions);
    if !rejected.is_empty() {
        warn!(role = %role, ?rejected, "ignoring malformed custom permission keys");
    }
    set
}

/// Effective permission set for a role claim and override list
pub fn effective_permissions<S: AsRef<str>>(role: &str, custom_permissions: &[S]) -> Result<PermissionSet> {
    Ok(effective_set(role.parse()?, custom_permissions))
}

/// Typed check
#[inline]
pub fn evaluate<S: AsRef<str>>(role: Role, custom_permissions: &[S], permission: Permission) -> bool {
    effective_set(role, custom_permissions).contains(permission)
}

/// Check whether `role` with `custom_permissions` may perform `action` on `area`.
///
/// `InvalidPermissionComponent` if area/action are not enum members,
/// `UnknownRole` if the role claim is not recognized. An ungranted but valid
/// permission is `Ok(false)`.
pub fn check_permission<S: AsRef<str>>(
    role: &str,
    custom_permissions: &[S],
    area: &str,
    action: &str,
) -> Result<bool> {
    let key = crate::permission::encode(area, action)?;
    let role: Role = role.parse()?;
    let requested = decode(&key)?;
    Ok(evaluate(role, custom_permissions, requested))
}

/// True iff `current` ranks at or above `required`
pub fn check_role(current: &str, required: &str) -> Result<bool> {
    is_at_least(current, required)
}

/// Decide for already-issued claims, absorbing data drift into denial
#[instrument(level = "debug", skip(claims), fields(permission = %permission))]
pub fn authorize(claims: &Claims, permission: Permission) -> Decision {
    let role = match resolve(claims) {
        Ok(role) => role,
        Err(d) => return d,
    };
    decide(role, claims, permission)
}

/// [`authorize`] restricted to resources owned by `scope`
#[instrument(level = "debug", skip(claims, scope), fields(permission = %permission))]
pub fn authorize_scoped(claims: &Claims, permission: Permission, scope: &Scope) -> Decision {
    let role = match resolve(claims) {
        Ok(role) => role,
        Err(d) => return d,
    };
    if !in_scope(role, claims, scope) {
        debug!(role = %role, ?scope, "denied: out of scope");
        return Decision::Deny;
    }
    decide(role, claims, permission)
}

/// Minimum-rank check for claims, with the same drift policy as [`authorize`]
pub fn authorize_role(claims: &Claims, required: Role) -> Decision {
    match resolve(claims) {
        Ok(role) if role.is_at_least(required) => Decision::Allow,
        Ok(_) => Decision::Deny,
        Err(d) => d,
    }
}

fn resolve(claims: &Claims) -> std::result::Result<Role, Decision> {
    if claims.disabled {
        debug!("denied: account disabled");
        return Err(Decision::Deny);
    }
    match claims.resolve_role() {
        Ok(role) => Ok(role),
        Err(RolegateError::UnknownRole(r)) => {
            warn!(role = %r, "unrecognized role claim; claims must be refreshed");
            Err(Decision::Reauthenticate)
        }
        Err(e) => {
            warn!(error = %e, "could not resolve role");
            Err(Decision::Deny)
        }
    }
}

fn decide(role: Role, claims: &Claims, permission: Permission) -> Decision {
    if evaluate(role, &claims.custom_permissions, permission) {
        debug!(role = %role, "allowed");
        Decision::Allow
    } else {
        debug!(role = %role, "denied");
        Decision::Deny
    }
}
