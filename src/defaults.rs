//! Default permission map
//!
//! Each role's set is declared on its own. Higher roles are supersets in
//! practice but nothing enforces it; [`monotonicity_violations`] reports
//! where the table departs from that.

use crate::error::Result;
use crate::permission::{Action, Area, PermissionSet};
use crate::role::{Role, ROLE_HIERARCHY};

use Action::*;
use Area::*;

const DATA_RW: [Action; 4] = [View, Create, Edit, Delete];

const FULL_CONTROL: PermissionSet =
    PermissionSet::full(&[Users, Tasks, Reports, Settings, Tools, Dashboard]).with_actions(Data, &DATA_RW);

const ORG_ADMIN: PermissionSet = PermissionSet::full(&[Users, Tasks, Reports])
    .with_actions(Settings, &[View, Edit])
    .with_actions(Tools, &[View, Create, Edit])
    .with_actions(Dashboard, &[View, Create, Edit])
    .with_actions(Data, &DATA_RW);

const ORG_SUPERVISOR: PermissionSet = PermissionSet::EMPTY
    .with_actions(Users, &[View])
    .with_actions(Tasks, &[View, Create, Edit, Approve, Assign])
    .with_actions(Reports, &[View, Create, Edit])
    .with_actions(Settings, &[View])
    .with_actions(Tools, &[View, Edit])
    .with_actions(Dashboard, &[View]);

const ORG_ENGINEER: PermissionSet = PermissionSet::EMPTY
    .with_actions(Users, &[View, Assign])
    .with_actions(Tasks, &[View, Create, Edit, Approve, Assign])
    .with_actions(Reports, &[View, Create, Edit, Approve])
    .with_actions(Settings, &[View, Edit])
    .with_actions(Tools, &[View, Create, Edit])
    .with_actions(Dashboard, &[View, Edit]);

const ORG_TECHNICIAN: PermissionSet = PermissionSet::EMPTY
    .with_actions(Tasks, &[View, Edit])
    .with_actions(Reports, &[View, Create])
    .with_actions(Tools, &[View, Edit])
    .with_actions(Dashboard, &[View]);

const ORG_ASSISTANT: PermissionSet = PermissionSet::EMPTY
    .with_actions(Tasks, &[View])
    .with_actions(Reports, &[View, Create])
    .with_actions(Tools, &[View])
    .with_actions(Dashboard, &[View]);

// Own content only; no user management, approval or assignment.
const INDEPENDENT: PermissionSet = PermissionSet::EMPTY
    .with_actions(Tasks, &[View, Create, Edit, Delete])
    .with_actions(Reports, &[View])
    .with_actions(Dashboard, &[View])
    .with_actions(Tools, &[View, Create, Edit])
    .with_actions(Settings, &[View, Edit])
    .with_actions(Data, &DATA_RW);

impl Role {
    /// Permissions granted to this role when the user carries no override
    pub const fn defaults(self) -> PermissionSet {
        match self {
            Role::SystemOwner | Role::SystemAdmin | Role::OrgOwner => FULL_CONTROL,
            Role::OrgAdmin => ORG_ADMIN,
            Role::OrgSupervisor => ORG_SUPERVISOR,
            Role::OrgEngineer => ORG_ENGINEER,
            Role::OrgTechnician => ORG_TECHNICIAN,
            Role::OrgAssistant => ORG_ASSISTANT,
            Role::Independent => INDEPENDENT,
        }
    }
}

/// Default set for a role claim; `UnknownRole` for unrecognized roles
pub fn defaults_for(role: &str) -> Result<PermissionSet> {
    Ok(role.parse::<Role>()?.defaults())
}

/// A higher-ranked role lacking permissions that a lower-ranked role has
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct MonotonicityViolation {
    pub higher: Role,
    pub lower: Role,
    pub missing: Vec<String>,
}

/// Every (higher, lower) pair where the higher role's defaults are not a superset
pub fn monotonicity_violations() -> Vec<MonotonicityViolation> {
    let mut out = Vec::new();
    for (i, &higher) in ROLE_HIERARCHY.iter().enumerate() {
        for &lower in &ROLE_HIERARCHY[i + 1..] {
            let missing = lower.defaults().difference(higher.defaults());
            if !missing.is_empty() {
                out.push(MonotonicityViolation { higher, lower, missing: missing.to_keys() });
            }
        }
    }
    out
}
