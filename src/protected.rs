//! Protected write API - all operations require an actor with permission
//!
//! The actor's stored record is turned into claims and authorized with the
//! same evaluator the rest of the system uses, scoped to the target user's
//! organization and department.

use crate::claims::Claims;
use crate::error::{Result, RolegateError};
use crate::evaluator::{authorize_role, authorize_scoped, effective_set, Decision};
use crate::migration::{migrate_legacy_roles, migrate_role, MigrationReport};
use crate::permission::{Action, Area, Permission, PermissionSet};
use crate::role::Role;
use crate::scope::Scope;
use crate::store::{self, UserRecord};

fn forbidden(actor: &str, reason: impl Into<String>) -> RolegateError {
    RolegateError::Forbidden { actor: actor.to_string(), reason: reason.into() }
}

fn scope_of(rec: &UserRecord) -> Scope {
    Scope {
        organization_id: rec.organization_id.clone(),
        department_id: rec.department_id.clone(),
    }
}

fn actor_claims(actor: &str) -> Result<Claims> {
    store::claims_for(actor).map_err(|e| match e {
        RolegateError::UserNotFound(_) => forbidden(actor, "act without a user record"),
        e => e,
    })
}

/// Load the actor and check it holds `permission` over `scope`
fn require(actor: &str, permission: Permission, scope: &Scope) -> Result<(Role, Claims)> {
    let claims = actor_claims(actor)?;
    match authorize_scoped(&claims, permission, scope) {
        Decision::Allow => Ok((claims.resolve_role()?, claims)),
        Decision::Deny => Err(forbidden(actor, format!("use {permission} in this scope"))),
        Decision::Reauthenticate => Err(forbidden(actor, "act with an unrecognized role")),
    }
}

fn require_target(actor: &str, uid: &str, permission: Permission) -> Result<(Role, Claims, UserRecord)> {
    let target = store::get_user(uid)?.ok_or_else(|| RolegateError::UserNotFound(uid.to_string()))?;
    let (role, claims) = require_over(actor, permission, &target)?;
    Ok((role, claims, target))
}

/// Check `permission` in the target's scope, and that the actor ranks at or above it
fn require_over(actor: &str, permission: Permission, target: &UserRecord) -> Result<(Role, Claims)> {
    let (role, claims) = require(actor, permission, &scope_of(target))?;
    // Unmigrated role strings rank by their legacy mapping; unmappable ones need a system actor.
    match migrate_role(&target.role) {
        Some(target_role) if !role.is_at_least(target_role) => {
            Err(forbidden(actor, format!("manage {target_role} user {}", target.uid)))
        }
        None if !role.is_system_role() => {
            Err(forbidden(actor, format!("manage user {} with role '{}'", target.uid, target.role)))
        }
        _ => Ok((role, claims)),
    }
}

/// No granting above one's own rank; system roles only from system roles
fn check_assignable(actor: &str, actor_role: Role, role: Role) -> Result<()> {
    if !actor_role.is_at_least(role) || (role.is_system_role() && !actor_role.is_system_role()) {
        return Err(forbidden(actor, format!("assign role {role}")));
    }
    Ok(())
}

/// Non-admins may only hand out permissions they hold themselves
fn check_grantable(actor: &str, actor_role: Role, claims: &Claims, keys: &[String]) -> Result<()> {
    let requested = PermissionSet::parse_strict(keys)?;
    if actor_role.is_admin() {
        return Ok(());
    }
    let own = effective_set(actor_role, &claims.custom_permissions);
    let missing = requested.difference(own);
    if !missing.is_empty() {
        return Err(forbidden(actor, format!("grant {}", missing.to_keys().join(", "))));
    }
    Ok(())
}

/// Create or replace a user record. Requires `users.create` in the record's scope,
/// and when replacing, in the existing record's scope over a user not ranked above the actor.
pub fn create_user(actor: &str, rec: UserRecord) -> Result<u64> {
    let create = Permission::new(Area::Users, Action::Create);
    if let Some(existing) = store::get_user(&rec.uid)? {
        require_over(actor, create, &existing)?;
    }
    let (actor_role, claims) = require(actor, create, &scope_of(&rec))?;
    check_assignable(actor, actor_role, rec.role.parse()?)?;
    check_grantable(actor, actor_role, &claims, &rec.custom_permissions)?;
    store::put_user(rec)
}

/// Change a user's role. Requires `users.assign`.
pub fn set_role(actor: &str, uid: &str, role: Role) -> Result<u64> {
    let (actor_role, _, _) = require_target(actor, uid, Permission::new(Area::Users, Action::Assign))?;
    check_assignable(actor, actor_role, role)?;
    store::set_role(uid, role)
}

/// Replace a user's override list. Requires `users.edit`.
pub fn set_custom_permissions(actor: &str, uid: &str, keys: &[String]) -> Result<u64> {
    let (actor_role, claims, _) = require_target(actor, uid, Permission::new(Area::Users, Action::Edit))?;
    check_grantable(actor, actor_role, &claims, keys)?;
    store::set_custom_permissions(uid, keys)
}

/// Reset a user to role defaults. Requires `users.edit`.
pub fn reset_custom_permissions(actor: &str, uid: &str) -> Result<u64> {
    require_target(actor, uid, Permission::new(Area::Users, Action::Edit))?;
    store::reset_custom_permissions(uid)
}

/// Enable or disable an account. Requires `users.edit`.
pub fn set_disabled(actor: &str, uid: &str, disabled: bool) -> Result<u64> {
    require_target(actor, uid, Permission::new(Area::Users, Action::Edit))?;
    store::set_disabled(uid, disabled)
}

/// Remove a user record. Requires `users.delete`.
pub fn delete_user(actor: &str, uid: &str) -> Result<bool> {
    require_target(actor, uid, Permission::new(Area::Users, Action::Delete))?;
    store::delete_user(uid)
}

/// Run the legacy role migration. Requires at least `isSystemAdmin`.
pub fn migrate(actor: &str) -> Result<MigrationReport> {
    let claims = actor_claims(actor)?;
    match authorize_role(&claims, Role::SystemAdmin) {
        Decision::Allow => migrate_legacy_roles(),
        _ => Err(forbidden(actor, "run the role migration")),
    }
}
