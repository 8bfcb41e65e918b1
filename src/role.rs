//! Role hierarchy table
//!
//! Roles are totally ordered by their position in [`ROLE_HIERARCHY`]; a lower
//! rank means more privilege. The claim id (`isOrgOwner`, ...) is the string
//! form used in signed claims and in storage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RolegateError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "isSystemOwner")]
    SystemOwner,
    #[serde(rename = "isSystemAdmin")]
    SystemAdmin,
    #[serde(rename = "isOrgOwner")]
    OrgOwner,
    #[serde(rename = "isOrgAdmin")]
    OrgAdmin,
    #[serde(rename = "isOrgSupervisor")]
    OrgSupervisor,
    #[serde(rename = "isOrgEngineer")]
    OrgEngineer,
    #[serde(rename = "isOrgTechnician")]
    OrgTechnician,
    #[serde(rename = "isOrgAssistant")]
    OrgAssistant,
    #[serde(rename = "isIndependent")]
    Independent,
}

/// All roles, highest privilege first
pub const ROLE_HIERARCHY: [Role; 9] = [
    Role::SystemOwner,
    Role::SystemAdmin,
    Role::OrgOwner,
    Role::OrgAdmin,
    Role::OrgSupervisor,
    Role::OrgEngineer,
    Role::OrgTechnician,
    Role::OrgAssistant,
    Role::Independent,
];

impl Role {
    /// Claim id as carried in tokens and user records
    pub const fn claim_id(self) -> &'static str {
        match self {
            Role::SystemOwner => "isSystemOwner",
            Role::SystemAdmin => "isSystemAdmin",
            Role::OrgOwner => "isOrgOwner",
            Role::OrgAdmin => "isOrgAdmin",
            Role::OrgSupervisor => "isOrgSupervisor",
            Role::OrgEngineer => "isOrgEngineer",
            Role::OrgTechnician => "isOrgTechnician",
            Role::OrgAssistant => "isOrgAssistant",
            Role::Independent => "isIndependent",
        }
    }

    /// Index into [`ROLE_HIERARCHY`]; 0 is the most privileged
    #[inline]
    pub const fn rank(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn is_at_least(self, minimum: Role) -> bool {
        self.rank() <= minimum.rank()
    }

    pub fn is_system_role(self) -> bool {
        matches!(self, Role::SystemOwner | Role::SystemAdmin)
    }

    pub fn is_org_role(self) -> bool {
        !self.is_system_role() && self != Role::Independent
    }

    /// Roles that administer users and permissions within their scope
    pub fn is_admin(self) -> bool {
        self.is_at_least(Role::OrgAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.claim_id())
    }
}

impl FromStr for Role {
    type Err = RolegateError;

    fn from_str(s: &str) -> Result<Self> {
        ROLE_HIERARCHY
            .iter()
            .copied()
            .find(|r| r.claim_id() == s)
            .ok_or_else(|| RolegateError::UnknownRole(s.to_string()))
    }
}

/// Ordered sequence of every role, highest privilege first
pub fn all_roles() -> &'static [Role] {
    &ROLE_HIERARCHY
}

/// Rank of a role claim; fails with `UnknownRole` for unrecognized input
pub fn rank_of(role: &str) -> Result<usize> {
    Ok(role.parse::<Role>()?.rank())
}

/// True iff `role` ranks at or above `minimum`
pub fn is_at_least(role: &str, minimum: &str) -> Result<bool> {
    Ok(rank_of(role)? <= rank_of(minimum)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_order_matches_rank() {
        for (i, role) in all_roles().iter().enumerate() {
            assert_eq!(role.rank(), i);
            assert_eq!(rank_of(role.claim_id()).unwrap(), i);
        }
    }

    #[test]
    fn ranks_strictly_increase() {
        for pair in ROLE_HIERARCHY.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }

    #[test]
    fn owner_first_independent_last() {
        assert_eq!(all_roles().first(), Some(&Role::SystemOwner));
        assert_eq!(all_roles().last(), Some(&Role::Independent));
    }

    #[test]
    fn unknown_role_rejected() {
        assert_eq!(
            rank_of("admin"),
            Err(RolegateError::UnknownRole("admin".into()))
        );
        assert!(rank_of("").is_err());
        // case matters
        assert!(rank_of("isorgowner").is_err());
    }

    #[test]
    fn at_least() {
        assert!(is_at_least("isOrgOwner", "isOrgAdmin").unwrap());
        assert!(is_at_least("isOrgAdmin", "isOrgAdmin").unwrap());
        assert!(!is_at_least("isOrgAssistant", "isOrgAdmin").unwrap());
        assert!(is_at_least("nobody", "isOrgAdmin").is_err());
        assert!(is_at_least("isOrgAdmin", "nobody").is_err());
    }

    #[test]
    fn classes() {
        assert!(Role::SystemAdmin.is_system_role());
        assert!(!Role::OrgOwner.is_system_role());
        assert!(Role::OrgTechnician.is_org_role());
        assert!(!Role::Independent.is_org_role());
        assert!(Role::OrgAdmin.is_admin());
        assert!(!Role::OrgSupervisor.is_admin());
    }

    #[test]
    fn serde_uses_claim_id() {
        let json = serde_json::to_string(&Role::OrgEngineer).unwrap();
        assert_eq!(json, "\"isOrgEngineer\"");
        let back: Role = serde_json::from_str("\"isIndependent\"").unwrap();
        assert_eq!(back, Role::Independent);
    }
}
