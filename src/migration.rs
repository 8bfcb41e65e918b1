//! One-shot migration of legacy role strings and permission keys
//!
//! Older records carry free-text roles (`admin`, `manager`, `org_owner`, ...)
//! and `area:action` override keys. This rewrites every stored record in a
//! single write transaction. Running it again changes nothing.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::permission::decode_legacy;
use crate::role::Role;
use crate::tx::transact;

const LEGACY_ROLES: &[(&str, Role)] = &[
    ("system_owner", Role::SystemOwner),
    ("system_admin", Role::SystemAdmin),
    ("organization_owner", Role::OrgOwner),
    ("org_owner", Role::OrgOwner),
    ("owner", Role::OrgOwner),
    ("org_admin", Role::OrgAdmin),
    ("admin", Role::OrgAdmin),
    ("manager", Role::OrgAdmin),
    ("org_supervisor", Role::OrgSupervisor),
    ("supervisor", Role::OrgSupervisor),
    ("org_engineer", Role::OrgEngineer),
    ("engineer", Role::OrgEngineer),
    ("org_technician", Role::OrgTechnician),
    ("technician", Role::OrgTechnician),
    ("org_assistant", Role::OrgAssistant),
    ("assistant", Role::OrgAssistant),
    ("user", Role::OrgAssistant),
    ("employee", Role::OrgAssistant),
    ("guest", Role::OrgAssistant),
    ("independent", Role::Independent),
];

/// Map a stored role string to a current role. Current claim ids map to themselves.
pub fn migrate_role(legacy: &str) -> Option<Role> {
    legacy.parse().ok().or_else(|| {
        LEGACY_ROLES
            .iter()
            .find(|(name, _)| *name == legacy)
            .map(|(_, role)| *role)
    })
}

/// Rewrite override keys to `area.action`, dropping keys that decode in no known form.
/// Returns the new list and whether anything changed.
pub fn normalize_keys(keys: &[String]) -> (Vec<String>, bool) {
    let mut out: Vec<String> = Vec::with_capacity(keys.len());
    for k in keys {
        if let Ok(p) = decode_legacy(k) {
            let key = p.key();
            if !out.contains(&key) {
                out.push(key);
            }
        }
    }
    let changed = out != keys;
    (out, changed)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub scanned: usize,
    pub roles_migrated: usize,
    pub permissions_normalized: usize,
    /// uids whose role matches nothing; left untouched for manual review
    pub unmapped: Vec<String>,
}

/// Migrate every stored record in one transaction
pub fn migrate_legacy_roles() -> Result<MigrationReport> {
    let report = transact(|tx| {
        let mut report = MigrationReport::default();
        for mut rec in tx.all_users()? {
            report.scanned += 1;
            let mut dirty = false;

            match migrate_role(&rec.role) {
                Some(role) if role.claim_id() != rec.role => {
                    rec.legacy_role = Some(std::mem::replace(&mut rec.role, role.claim_id().to_string()));
                    report.roles_migrated += 1;
                    dirty = true;
                }
                Some(_) => {}
                None => {
                    warn!(uid = %rec.uid, role = %rec.role, "legacy role has no mapping");
                    report.unmapped.push(rec.uid.clone());
                }
            }

            let (keys, changed) = normalize_keys(&rec.custom_permissions);
            if changed {
                rec.custom_permissions = keys;
                report.permissions_normalized += 1;
                dirty = true;
            }

            if dirty {
                tx.put_user(rec)?;
            }
        }
        Ok(report)
    })?;
    info!(
        scanned = report.scanned,
        roles = report.roles_migrated,
        permissions = report.permissions_normalized,
        unmapped = report.unmapped.len(),
        "legacy role migration finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_legacy_names() {
        assert_eq!(migrate_role("admin"), Some(Role::OrgAdmin));
        assert_eq!(migrate_role("manager"), Some(Role::OrgAdmin));
        assert_eq!(migrate_role("org_owner"), Some(Role::OrgOwner));
        assert_eq!(migrate_role("guest"), Some(Role::OrgAssistant));
        assert_eq!(migrate_role("isOrgEngineer"), Some(Role::OrgEngineer));
        assert_eq!(migrate_role("superuser"), None);
    }

    #[test]
    fn every_current_role_maps_to_itself() {
        for role in crate::role::all_roles() {
            assert_eq!(migrate_role(role.claim_id()), Some(*role));
        }
    }

    #[test]
    fn normalizes_keys() {
        let keys: Vec<String> = ["tasks:view", "tasks.view", "reports.edit", "junk"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let (out, changed) = normalize_keys(&keys);
        assert!(changed);
        assert_eq!(out, vec!["tasks.view", "reports.edit"]);

        let (again, changed) = normalize_keys(&out);
        assert!(!changed);
        assert_eq!(again, out);
    }
}
