//! Rolegate REST API Server
//!
//! Run with: cargo run --features server --bin rolegate-server
//!
//! Endpoints:
//!   GET    /health                  - Health check with store epoch
//!   GET    /roles                   - Role hierarchy with ranks
//!   GET    /roles/:role/defaults    - Default permission keys of a role
//!   POST   /check                   - Evaluate a permission
//!   POST   /check-role              - Minimum-rank check
//!   POST   /bootstrap               - Create the first system owner
//!   POST   /migrate                 - Run the legacy role migration
//!   GET    /users/:uid/claims       - Claims to sign for a user
//!   PUT    /users/:uid              - Create or replace a user
//!   DELETE /users/:uid              - Delete a user
//!   PUT    /users/:uid/role         - Change a user's role
//!   PUT    /users/:uid/disabled     - Enable or disable an account
//!   PUT    /users/:uid/permissions  - Replace a user's custom permissions
//!   DELETE /users/:uid/permissions  - Reset a user to role defaults

use axum::{
    extract::Path,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use rolegate::{
    all_roles, bootstrap, check_permission, check_role, claims_for, current_epoch, defaults_for, init_with,
    is_bootstrapped, protected, AccountType, Claims, Config, MigrationReport, Role, RolegateError, UserRecord,
};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
struct CheckReq {
    role: String,
    #[serde(default)]
    custom_permissions: Vec<String>,
    area: String,
    action: String,
}

#[derive(Deserialize)]
struct CheckRoleReq {
    role: String,
    required_role: String,
}

#[derive(Deserialize)]
struct BootstrapReq {
    root_uid: String,
}

#[derive(Deserialize)]
struct ActorReq {
    actor: String,
}

#[derive(Deserialize)]
struct UserReq {
    actor: String,
    role: Role,
    #[serde(default)]
    custom_permissions: Vec<String>,
    account_type: AccountType,
    organization_id: Option<String>,
    department_id: Option<String>,
}

#[derive(Deserialize)]
struct RoleReq {
    actor: String,
    role: Role,
}

#[derive(Deserialize)]
struct DisabledReq {
    actor: String,
    disabled: bool,
}

#[derive(Deserialize)]
struct PermissionsReq {
    actor: String,
    permissions: Vec<String>,
}

#[derive(Serialize)]
struct CheckRes {
    allowed: bool,
}

#[derive(Serialize)]
struct RoleInfo {
    role: Role,
    rank: usize,
}

#[derive(Serialize)]
struct VersionRes {
    claims_version: u64,
}

#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    reauthenticate: bool,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None, reauthenticate: false }
    }

    fn err(e: &RolegateError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(e.to_string()),
            reauthenticate: matches!(e, RolegateError::UnknownRole(_)),
        }
    }
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

// ============================================================================
// Helpers
// ============================================================================

fn status_of(e: &RolegateError) -> StatusCode {
    StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

fn reply<T>(r: rolegate::Result<T>) -> Reply<T> {
    match r {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))),
        Err(e) => {
            let status = status_of(&e);
            if status.is_server_error() {
                tracing::error!(error = %e, "request failed");
            }
            (status, Json(ApiResponse::err(&e)))
        }
    }
}

fn versioned(r: rolegate::Result<u64>) -> Reply<VersionRes> {
    reply(r.map(|claims_version| VersionRes { claims_version }))
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_health() -> Reply<serde_json::Value> {
    reply(current_epoch().and_then(|epoch| {
        Ok(serde_json::json!({
            "status": "ok",
            "bootstrapped": is_bootstrapped()?,
            "epoch": epoch,
        }))
    }))
}

async fn get_roles() -> Json<ApiResponse<Vec<RoleInfo>>> {
    let roles = all_roles().iter().map(|&role| RoleInfo { role, rank: role.rank() }).collect();
    Json(ApiResponse::ok(roles))
}

async fn get_role_defaults(Path(role): Path<String>) -> Reply<Vec<String>> {
    reply(defaults_for(&role).map(|set| set.to_keys()))
}

async fn post_check(Json(req): Json<CheckReq>) -> Reply<CheckRes> {
    reply(
        check_permission(&req.role, &req.custom_permissions, &req.area, &req.action)
            .map(|allowed| CheckRes { allowed }),
    )
}

async fn post_check_role(Json(req): Json<CheckRoleReq>) -> Reply<CheckRes> {
    reply(check_role(&req.role, &req.required_role).map(|allowed| CheckRes { allowed }))
}

async fn post_bootstrap(Json(req): Json<BootstrapReq>) -> Reply<VersionRes> {
    versioned(bootstrap(&req.root_uid))
}

async fn post_migrate(Json(req): Json<ActorReq>) -> Reply<MigrationReport> {
    reply(protected::migrate(&req.actor))
}

async fn get_claims(Path(uid): Path<String>) -> Reply<Claims> {
    reply(claims_for(&uid))
}

async fn put_user(Path(uid): Path<String>, Json(req): Json<UserReq>) -> Reply<VersionRes> {
    let rec = UserRecord {
        role: req.role.claim_id().to_string(),
        custom_permissions: req.custom_permissions,
        account_type: req.account_type,
        organization_id: req.organization_id,
        department_id: req.department_id,
        ..UserRecord::individual(uid)
    };
    versioned(protected::create_user(&req.actor, rec))
}

async fn delete_user(Path(uid): Path<String>, Json(req): Json<ActorReq>) -> Reply<bool> {
    reply(protected::delete_user(&req.actor, &uid))
}

async fn put_role(Path(uid): Path<String>, Json(req): Json<RoleReq>) -> Reply<VersionRes> {
    versioned(protected::set_role(&req.actor, &uid, req.role))
}

async fn put_disabled(Path(uid): Path<String>, Json(req): Json<DisabledReq>) -> Reply<VersionRes> {
    versioned(protected::set_disabled(&req.actor, &uid, req.disabled))
}

async fn put_permissions(Path(uid): Path<String>, Json(req): Json<PermissionsReq>) -> Reply<VersionRes> {
    versioned(protected::set_custom_permissions(&req.actor, &uid, &req.permissions))
}

async fn delete_permissions(Path(uid): Path<String>, Json(req): Json<ActorReq>) -> Reply<VersionRes> {
    versioned(protected::reset_custom_permissions(&req.actor, &uid))
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    tracing::info!(db_path = %config.db_path, "initializing store");
    init_with(&config)?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(get_health))
        .route("/roles", get(get_roles))
        .route("/roles/:role/defaults", get(get_role_defaults))
        .route("/check", post(post_check))
        .route("/check-role", post(post_check_role))
        .route("/bootstrap", post(post_bootstrap))
        .route("/migrate", post(post_migrate))
        .route("/users/:uid/claims", get(get_claims))
        .route("/users/:uid", put(put_user).delete(delete_user))
        .route("/users/:uid/role", put(put_role))
        .route("/users/:uid/disabled", put(put_disabled))
        .route("/users/:uid/permissions", put(put_permissions).delete(delete_permissions))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = config.bind_addr();
    tracing::info!(%addr, "rolegate server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
