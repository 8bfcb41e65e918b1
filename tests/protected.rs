//! Actor-checked writes: permission, scope and escalation rules

use std::sync::OnceLock;

use rolegate::store::{self, UserRecord};
use rolegate::{bootstrap, clear_all, get_user, init, protected, test_lock, Role, RolegateError};
use tempfile::TempDir;

static TEST_DIR: OnceLock<TempDir> = OnceLock::new();

fn setup() -> std::sync::MutexGuard<'static, ()> {
    let lock = test_lock();
    let dir = TEST_DIR.get_or_init(|| TempDir::new().unwrap());
    init(dir.path().to_str().unwrap()).unwrap();
    clear_all().unwrap();
    bootstrap("root").unwrap();
    lock
}

/// root -> owner@acme -> admin@acme, plus an engineer and an assistant in acme/ops
fn seed_org() {
    protected::create_user("root", UserRecord::member("owner", Role::OrgOwner, "acme")).unwrap();
    protected::create_user("owner", UserRecord::member("admin", Role::OrgAdmin, "acme")).unwrap();
    protected::create_user(
        "admin",
        UserRecord::member("eng", Role::OrgEngineer, "acme").in_department("ops"),
    )
    .unwrap();
    protected::create_user(
        "admin",
        UserRecord::member("asst", Role::OrgAssistant, "acme").in_department("ops"),
    )
    .unwrap();
}

fn is_forbidden<T: std::fmt::Debug>(r: rolegate::Result<T>) -> bool {
    matches!(r, Err(RolegateError::Forbidden { .. }))
}

#[test]
fn chain_of_creation() {
    let _lock = setup();
    seed_org();

    for uid in ["owner", "admin", "eng", "asst"] {
        assert!(get_user(uid).unwrap().is_some(), "{uid}");
    }
}

#[test]
fn unknown_actor_is_forbidden() {
    let _lock = setup();

    assert!(is_forbidden(protected::create_user("mallory", UserRecord::individual("x"))));
    assert!(get_user("x").unwrap().is_none());
}

#[test]
fn cannot_create_outside_own_organization() {
    let _lock = setup();
    seed_org();

    let r = protected::create_user("owner", UserRecord::member("spy", Role::OrgAssistant, "globex"));
    assert!(is_forbidden(r));
    assert!(get_user("spy").unwrap().is_none());
}

#[test]
fn cannot_assign_above_own_rank() {
    let _lock = setup();
    seed_org();

    assert!(is_forbidden(protected::set_role("admin", "asst", Role::OrgOwner)));
    assert!(is_forbidden(protected::create_user(
        "owner",
        UserRecord::member("sa", Role::SystemAdmin, "acme")
    )));
    assert_eq!(get_user("asst").unwrap().unwrap().role, "isOrgAssistant");
}

#[test]
fn cannot_manage_higher_ranked_user() {
    let _lock = setup();
    seed_org();

    assert!(is_forbidden(protected::set_role("admin", "owner", Role::OrgAdmin)));
    assert!(is_forbidden(protected::delete_user("admin", "owner")));
    assert!(get_user("owner").unwrap().is_some());
}

#[test]
fn system_roles_only_from_system_roles() {
    let _lock = setup();
    seed_org();

    protected::set_role("root", "admin", Role::SystemAdmin).unwrap();
    assert_eq!(get_user("admin").unwrap().unwrap().role, "isSystemAdmin");
}

#[test]
fn supervisor_cannot_create_users() {
    let _lock = setup();
    seed_org();
    protected::create_user("admin", UserRecord::member("sup", Role::OrgSupervisor, "acme")).unwrap();

    let r = protected::create_user("sup", UserRecord::member("new", Role::OrgAssistant, "acme"));
    assert!(is_forbidden(r));
}

#[test]
fn engineer_assigns_within_department() {
    let _lock = setup();
    seed_org();

    protected::set_role("eng", "asst", Role::OrgTechnician).unwrap();
    assert_eq!(get_user("asst").unwrap().unwrap().role, "isOrgTechnician");

    // Supervisor ranks above engineer.
    assert!(is_forbidden(protected::set_role("eng", "asst", Role::OrgSupervisor)));

    protected::create_user(
        "admin",
        UserRecord::member("lab", Role::OrgAssistant, "acme").in_department("lab"),
    )
    .unwrap();
    assert!(is_forbidden(protected::set_role("eng", "lab", Role::OrgTechnician)));
}

#[test]
fn non_admins_grant_only_what_they_hold() {
    let _lock = setup();
    seed_org();
    protected::set_custom_permissions("admin", "eng", &["users.edit".into(), "tasks.view".into()]).unwrap();

    protected::set_custom_permissions("eng", "asst", &["tasks.view".into()]).unwrap();
    assert_eq!(get_user("asst").unwrap().unwrap().custom_permissions, vec!["tasks.view"]);

    let r = protected::set_custom_permissions("eng", "asst", &["settings.edit".into()]);
    assert!(is_forbidden(r));
    assert_eq!(get_user("asst").unwrap().unwrap().custom_permissions, vec!["tasks.view"]);
}

#[test]
fn admins_grant_anything_in_scope() {
    let _lock = setup();
    seed_org();

    protected::set_custom_permissions("admin", "asst", &["data.delete".into()]).unwrap();
    protected::reset_custom_permissions("admin", "asst").unwrap();
    assert!(get_user("asst").unwrap().unwrap().custom_permissions.is_empty());
}

#[test]
fn malformed_grant_is_rejected() {
    let _lock = setup();
    seed_org();

    let r = protected::set_custom_permissions("admin", "asst", &["tasks:view".into()]);
    assert!(matches!(r, Err(RolegateError::MalformedPermissionKey(_))));
}

#[test]
fn disabled_actor_is_forbidden() {
    let _lock = setup();
    seed_org();

    protected::set_disabled("owner", "admin", true).unwrap();
    assert!(is_forbidden(protected::delete_user("admin", "asst")));
    protected::set_disabled("owner", "admin", false).unwrap();
    assert!(protected::delete_user("admin", "asst").unwrap());
}

#[test]
fn missing_target_is_not_found() {
    let _lock = setup();
    seed_org();

    assert!(matches!(
        protected::set_role("admin", "ghost", Role::OrgAssistant),
        Err(RolegateError::UserNotFound(_))
    ));
}

#[test]
fn replace_cannot_overwrite_higher_ranked_user() {
    let _lock = setup();
    seed_org();

    let r = protected::create_user("admin", UserRecord::member("owner", Role::OrgAssistant, "acme"));
    assert!(is_forbidden(r));
    assert_eq!(get_user("owner").unwrap().unwrap().role, "isOrgOwner");

    let r = protected::create_user("admin", UserRecord::member("root", Role::OrgAssistant, "acme"));
    assert!(is_forbidden(r));
    let root = get_user("root").unwrap().unwrap();
    assert_eq!(root.role, "isSystemOwner");
    assert!(root.organization_id.is_none());
}

#[test]
fn replace_cannot_pull_user_from_other_organization() {
    let _lock = setup();
    seed_org();
    protected::create_user("root", UserRecord::member("g", Role::OrgAssistant, "globex")).unwrap();

    let r = protected::create_user("owner", UserRecord::member("g", Role::OrgAssistant, "acme"));
    assert!(is_forbidden(r));
    assert_eq!(get_user("g").unwrap().unwrap().organization_id.as_deref(), Some("globex"));
}

#[test]
fn replace_lower_ranked_user_in_scope() {
    let _lock = setup();
    seed_org();

    protected::create_user(
        "admin",
        UserRecord::member("asst", Role::OrgTechnician, "acme").in_department("ops"),
    )
    .unwrap();
    assert_eq!(get_user("asst").unwrap().unwrap().role, "isOrgTechnician");
}

#[test]
fn legacy_role_target_ranks_by_its_mapping() {
    let _lock = setup();
    seed_org();
    store::put_user(UserRecord::member("boss", Role::OrgOwner, "acme").with_raw_role("org_owner")).unwrap();

    assert!(is_forbidden(protected::delete_user("admin", "boss")));
    assert!(is_forbidden(protected::set_disabled("admin", "boss", true)));
    assert!(get_user("boss").unwrap().is_some());

    assert!(protected::delete_user("owner", "boss").unwrap());
}

#[test]
fn unmappable_role_target_needs_system_actor() {
    let _lock = setup();
    seed_org();
    store::put_user(UserRecord::member("odd", Role::OrgAssistant, "acme").with_raw_role("superuser")).unwrap();

    assert!(is_forbidden(protected::delete_user("owner", "odd")));
    assert!(get_user("odd").unwrap().is_some());
    assert!(protected::delete_user("root", "odd").unwrap());
}

#[test]
fn migration_needs_system_admin() {
    let _lock = setup();
    seed_org();

    assert!(is_forbidden(protected::migrate("owner")));
    let report = protected::migrate("root").unwrap();
    assert_eq!(report.scanned, 5);
    assert_eq!(report.roles_migrated, 0);
}
