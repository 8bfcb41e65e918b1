//! Organizational and departmental scoping

use serde::{Deserialize, Serialize};

use crate::claims::Claims;
use crate::role::Role;

/// Owner of a protected resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
}

impl Scope {
    /// Resource owned by an individual user, outside any organization
    pub fn personal() -> Self {
        Scope::default()
    }

    pub fn organization(org: impl Into<String>) -> Self {
        Scope { organization_id: Some(org.into()), department_id: None }
    }

    pub fn department(org: impl Into<String>, dept: impl Into<String>) -> Self {
        Scope { organization_id: Some(org.into()), department_id: Some(dept.into()) }
    }
}

/// Whether a user holding `role` with `claims` may act on a resource in `scope`
pub fn in_scope(role: Role, claims: &Claims, scope: &Scope) -> bool {
    if role.is_system_role() {
        return true;
    }
    if role == Role::Independent {
        return scope.organization_id.is_none();
    }

    let same_org = match (&claims.organization_id, &scope.organization_id) {
        (Some(mine), Some(theirs)) => mine == theirs,
        _ => false,
    };
    if !same_org {
        return false;
    }
    if role.is_at_least(Role::OrgAdmin) {
        return true;
    }

    // Department-bound roles: only when both sides name a department do they have to agree.
    match (&claims.department_id, &scope.department_id) {
        (Some(mine), Some(theirs)) => mine == theirs,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(org: Option<&str>, dept: Option<&str>) -> Claims {
        Claims {
            organization_id: org.map(String::from),
            department_id: dept.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn system_roles_everywhere() {
        let c = member(None, None);
        assert!(in_scope(Role::SystemAdmin, &c, &Scope::department("acme", "ops")));
        assert!(in_scope(Role::SystemOwner, &c, &Scope::personal()));
    }

    #[test]
    fn independent_only_personal() {
        let c = member(None, None);
        assert!(in_scope(Role::Independent, &c, &Scope::personal()));
        assert!(!in_scope(Role::Independent, &c, &Scope::organization("acme")));
    }

    #[test]
    fn org_admin_whole_org() {
        let c = member(Some("acme"), Some("ops"));
        assert!(in_scope(Role::OrgAdmin, &c, &Scope::department("acme", "sales")));
        assert!(!in_scope(Role::OrgOwner, &c, &Scope::organization("globex")));
        assert!(!in_scope(Role::OrgOwner, &c, &Scope::personal()));
    }

    #[test]
    fn department_roles() {
        let c = member(Some("acme"), Some("ops"));
        assert!(in_scope(Role::OrgSupervisor, &c, &Scope::department("acme", "ops")));
        assert!(!in_scope(Role::OrgSupervisor, &c, &Scope::department("acme", "sales")));
        assert!(in_scope(Role::OrgTechnician, &c, &Scope::organization("acme")));

        let no_dept = member(Some("acme"), None);
        assert!(in_scope(Role::OrgAssistant, &no_dept, &Scope::department("acme", "sales")));
    }

    #[test]
    fn org_member_without_org_claim() {
        let c = member(None, None);
        assert!(!in_scope(Role::OrgAdmin, &c, &Scope::organization("acme")));
    }
}
