//! Rolegate - role hierarchy and permission evaluation for organizational task management
//!
//! Nine roles in a fixed order, a default permission table per role, and a
//! check that lets a non-empty per-user override replace those defaults.
//! Permissions are `(area, action)` pairs, `"area.action"` at the boundary
//! and a bitmask inside.
//!
//! ```
//! use rolegate::check_permission;
//!
//! let none: &[&str] = &[];
//! assert!(check_permission("isOrgOwner", none, "settings", "edit").unwrap());
//! assert!(!check_permission("isOrgAssistant", &["tasks.view"], "tasks", "edit").unwrap());
//! ```
//!
//! The optional store keeps user records (role, override, org/department) in
//! LMDB and versions every change so stale claims can be detected.

pub mod bootstrap;
pub mod claims;
pub mod config;
pub mod db;
pub mod defaults;
pub mod error;
pub mod evaluator;
pub mod migration;
pub mod permission;
pub mod protected;
pub mod role;
pub mod scope;
pub mod store;
pub mod tx;

pub use bootstrap::{bootstrap, is_bootstrapped};
pub use claims::{AccountType, Claims};
pub use config::Config;
pub use db::{clear_all, init, init_with, test_lock};
pub use defaults::{defaults_for, monotonicity_violations, MonotonicityViolation};
pub use error::{Component, Result, RolegateError};
pub use evaluator::{
    authorize, authorize_role, authorize_scoped, check_permission, check_role, effective_permissions,
    evaluate, Decision,
};
pub use migration::{migrate_legacy_roles, migrate_role, MigrationReport};
pub use permission::{decode, decode_legacy, encode, Action, Area, Permission, PermissionSet};
pub use role::{all_roles, is_at_least, rank_of, Role, ROLE_HIERARCHY};
pub use scope::{in_scope, Scope};
pub use store::{claims_for, claims_stale, current_epoch, get_user, list_users, UserRecord};
pub use tx::{transact, Tx};
