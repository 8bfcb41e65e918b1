//! Claims supplied by the identity layer
//!
//! Tokens are verified elsewhere; this module only fixes the shape of the
//! decoded claims and how a role is derived from them. Claims are cached on
//! the client, so after any server-side role or permission change the caller
//! must re-fetch them before evaluating (see [`crate::store::claims_stale`]).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::role::Role;
use crate::store::UserRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Individual,
    Organization,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub custom_permissions: Vec<String>,

    #[serde(default)]
    pub is_system_owner: bool,
    #[serde(default)]
    pub is_system_admin: bool,
    #[serde(default)]
    pub is_org_owner: bool,
    #[serde(default)]
    pub is_org_admin: bool,
    #[serde(default)]
    pub is_org_supervisor: bool,
    #[serde(default)]
    pub is_org_engineer: bool,
    #[serde(default)]
    pub is_org_technician: bool,
    #[serde(default)]
    pub is_org_assistant: bool,
    #[serde(default)]
    pub is_independent: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<AccountType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub claims_version: u64,
}

impl Claims {
    /// Claims carrying only a role string and an override list
    pub fn with_role(role: impl Into<String>, custom_permissions: Vec<String>) -> Self {
        Claims {
            role: Some(role.into()),
            custom_permissions,
            ..Default::default()
        }
    }

    fn flag(&self, role: Role) -> bool {
        match role {
            Role::SystemOwner => self.is_system_owner,
            Role::SystemAdmin => self.is_system_admin,
            Role::OrgOwner => self.is_org_owner,
            Role::OrgAdmin => self.is_org_admin,
            Role::OrgSupervisor => self.is_org_supervisor,
            Role::OrgEngineer => self.is_org_engineer,
            Role::OrgTechnician => self.is_org_technician,
            Role::OrgAssistant => self.is_org_assistant,
            Role::Independent => self.is_independent,
        }
    }

    fn set_flag(&mut self, role: Role) {
        match role {
            Role::SystemOwner => self.is_system_owner = true,
            Role::SystemAdmin => self.is_system_admin = true,
            Role::OrgOwner => self.is_org_owner = true,
            Role::OrgAdmin => self.is_org_admin = true,
            Role::OrgSupervisor => self.is_org_supervisor = true,
            Role::OrgEngineer => self.is_org_engineer = true,
            Role::OrgTechnician => self.is_org_technician = true,
            Role::OrgAssistant => self.is_org_assistant = true,
            Role::Independent => self.is_independent = true,
        }
    }

    /// Effective role.
    ///
    /// The highest set `is*` flag wins; then the `role` string, which must be
    /// a known claim id; then the account type (`individual` users default to
    /// independent, everyone else to assistant).
    pub fn resolve_role(&self) -> Result<Role> {
        if let Some(r) = crate::role::all_roles().iter().copied().find(|r| self.flag(*r)) {
            return Ok(r);
        }
        if let Some(role) = &self.role {
            return role.parse();
        }
        Ok(match self.account_type {
            Some(AccountType::Individual) => Role::Independent,
            _ => Role::OrgAssistant,
        })
    }

    /// Claims the identity layer signs for a stored user
    pub fn from_record(rec: &UserRecord) -> Self {
        let mut c = Claims {
            role: Some(rec.role.clone()),
            custom_permissions: rec.custom_permissions.clone(),
            account_type: Some(rec.account_type),
            organization_id: rec.organization_id.clone(),
            department_id: rec.department_id.clone(),
            disabled: rec.disabled,
            claims_version: rec.claims_version,
            ..Default::default()
        };
        if let Ok(role) = rec.role.parse::<Role>() {
            c.set_flag(role);
        }
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highest_flag_wins() {
        let c = Claims {
            is_org_admin: true,
            is_org_technician: true,
            role: Some("isOrgAssistant".into()),
            ..Default::default()
        };
        assert_eq!(c.resolve_role().unwrap(), Role::OrgAdmin);
    }

    #[test]
    fn role_string_when_no_flags() {
        let c = Claims::with_role("isOrgEngineer", vec![]);
        assert_eq!(c.resolve_role().unwrap(), Role::OrgEngineer);
    }

    #[test]
    fn unknown_role_string_is_error() {
        let c = Claims::with_role("manager", vec![]);
        assert!(c.resolve_role().is_err());
    }

    #[test]
    fn account_type_fallback() {
        let mut c = Claims::default();
        assert_eq!(c.resolve_role().unwrap(), Role::OrgAssistant);
        c.account_type = Some(AccountType::Individual);
        assert_eq!(c.resolve_role().unwrap(), Role::Independent);
    }

    #[test]
    fn deserializes_camel_case() {
        let c: Claims = serde_json::from_str(
            r#"{"isOrgOwner":true,"customPermissions":["tasks.view"],"organizationId":"acme","accountType":"organization","claimsVersion":7}"#,
        )
        .unwrap();
        assert_eq!(c.resolve_role().unwrap(), Role::OrgOwner);
        assert_eq!(c.custom_permissions, vec!["tasks.view"]);
        assert_eq!(c.organization_id.as_deref(), Some("acme"));
        assert_eq!(c.claims_version, 7);
        assert!(!c.disabled);
    }
}
