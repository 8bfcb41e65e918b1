//! User records carrying roles and custom permission overrides
//!
//! Reads go straight to LMDB. Writes here perform no permission checks; the
//! [`crate::protected`] layer wraps them for actor-initiated changes.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::claims::{AccountType, Claims};
use crate::db::{read, EPOCH};
use crate::error::{err, Result, RolegateError};
use crate::role::Role;
use crate::tx::transact;

/// Stored user. `role` stays a raw string so legacy values survive until migrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: String,
    pub role: String,
    #[serde(default)]
    pub custom_permissions: Vec<String>,
    pub account_type: AccountType,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub claims_version: u64,
    #[serde(default)]
    pub legacy_role: Option<String>,
    #[serde(default)]
    pub updated_at: u64,
}

impl UserRecord {
    fn base(uid: String, role: Role, account_type: AccountType, organization_id: Option<String>) -> Self {
        UserRecord {
            uid,
            role: role.claim_id().to_string(),
            custom_permissions: Vec::new(),
            account_type,
            organization_id,
            department_id: None,
            disabled: false,
            claims_version: 0,
            legacy_role: None,
            updated_at: 0,
        }
    }

    /// Member of an organization
    pub fn member(uid: impl Into<String>, role: Role, organization_id: impl Into<String>) -> Self {
        Self::base(uid.into(), role, AccountType::Organization, Some(organization_id.into()))
    }

    /// Individual account outside any organization
    pub fn individual(uid: impl Into<String>) -> Self {
        Self::base(uid.into(), Role::Independent, AccountType::Individual, None)
    }

    /// System-level account (owner or admin)
    pub fn system(uid: impl Into<String>, role: Role) -> Self {
        Self::base(uid.into(), role, AccountType::Organization, None)
    }

    pub fn in_department(mut self, department_id: impl Into<String>) -> Self {
        self.department_id = Some(department_id.into());
        self
    }

    pub fn with_custom_permissions<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.custom_permissions = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_raw_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }
}

pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ============================================================================
// Reads
// ============================================================================

pub fn get_user(uid: &str) -> Result<Option<UserRecord>> {
    read(|d, tx| d.users.get(tx, uid).map_err(err))
}

pub fn list_users() -> Result<Vec<UserRecord>> {
    read(|d, tx| {
        let mut r = Vec::new();
        for item in d.users.iter(tx).map_err(err)? {
            let (_, rec) = item.map_err(err)?;
            r.push(rec);
        }
        Ok(r)
    })
}

/// Claims the identity layer should sign for `uid`
pub fn claims_for(uid: &str) -> Result<Claims> {
    get_user(uid)?
        .map(|rec| Claims::from_record(&rec))
        .ok_or_else(|| RolegateError::UserNotFound(uid.to_string()))
}

/// True when `uid`'s record changed after `claims` were issued (or was deleted)
pub fn claims_stale(claims: &Claims, uid: &str) -> Result<bool> {
    Ok(match get_user(uid)? {
        Some(rec) => rec.claims_version > claims.claims_version,
        None => true,
    })
}

/// Latest claims version handed out
pub fn current_epoch() -> Result<u64> {
    read(|d, tx| Ok(d.meta.get(tx, EPOCH).map_err(err)?.unwrap_or(0)))
}

// ============================================================================
// Writes
// ============================================================================

/// Create or replace a record; returns its new claims version
pub fn put_user(rec: UserRecord) -> Result<u64> {
    let uid = rec.uid.clone();
    let v = transact(|tx| tx.put_user(rec))?;
    tracing::info!(uid = %uid, version = v, "user record stored");
    Ok(v)
}

pub fn set_role(uid: &str, role: Role) -> Result<u64> {
    let v = transact(|tx| tx.set_role(uid, role))?;
    tracing::info!(uid, role = %role, version = v, "role updated; claims must be refreshed");
    Ok(v)
}

/// Replace a user's override. Malformed keys reject the whole write.
pub fn set_custom_permissions<S: AsRef<str>>(uid: &str, keys: &[S]) -> Result<u64> {
    let v = transact(|tx| tx.set_custom_permissions(uid, keys))?;
    tracing::info!(uid, count = keys.len(), version = v, "custom permissions updated; claims must be refreshed");
    Ok(v)
}

/// Reset to role defaults
pub fn reset_custom_permissions(uid: &str) -> Result<u64> {
    let v = transact(|tx| tx.reset_custom_permissions(uid))?;
    tracing::info!(uid, version = v, "custom permissions reset");
    Ok(v)
}

pub fn set_disabled(uid: &str, disabled: bool) -> Result<u64> {
    let v = transact(|tx| tx.set_disabled(uid, disabled))?;
    let state = if disabled { "disabled" } else { "enabled" };
    tracing::info!(uid, version = v, "account {state}; claims must be refreshed");
    Ok(v)
}

pub fn delete_user(uid: &str) -> Result<bool> {
    let removed = transact(|tx| tx.delete_user(uid))?;
    if removed {
        tracing::info!(uid, "user record deleted");
    }
    Ok(removed)
}
