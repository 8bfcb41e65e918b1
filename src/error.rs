//! Error types for rolegate

use std::fmt;

/// Which half of a permission pair was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Area,
    Action,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Area => f.write_str("area"),
            Component::Action => f.write_str("action"),
        }
    }
}

/// The main error type for rolegate operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RolegateError {
    /// Role claim matches no entry of the hierarchy. Data-integrity failure.
    #[error("unknown role '{0}'")]
    UnknownRole(String),

    /// Call site passed an area or action outside the enumerations. Caller bug.
    #[error("invalid permission {component} '{value}'")]
    InvalidPermissionComponent { component: Component, value: String },

    /// Stored permission string does not decode to an (area, action) pair.
    #[error("malformed permission key '{0}'")]
    MalformedPermissionKey(String),

    #[error("user '{0}' not found")]
    UserNotFound(String),

    #[error("{actor} is not allowed to {reason}")]
    Forbidden { actor: String, reason: String },

    #[error("already bootstrapped")]
    AlreadyBootstrapped,

    #[error("store not initialized")]
    NotInitialized,

    #[error("store already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl RolegateError {
    /// True for errors caused by stale or corrupted claims rather than caller misuse
    pub fn is_data_drift(&self) -> bool {
        matches!(
            self,
            RolegateError::UnknownRole(_) | RolegateError::MalformedPermissionKey(_)
        )
    }
}

impl RolegateError {
    /// HTTP status the server answers with for this error
    pub fn status_code(&self) -> u16 {
        match self {
            RolegateError::InvalidPermissionComponent { .. } | RolegateError::MalformedPermissionKey(_) => 400,
            RolegateError::UnknownRole(_) => 401,
            RolegateError::Forbidden { .. } => 403,
            RolegateError::UserNotFound(_) => 404,
            RolegateError::AlreadyBootstrapped => 409,
            RolegateError::NotInitialized | RolegateError::AlreadyInitialized(_) | RolegateError::Storage(_) => 500,
        }
    }
}

/// Result type alias for rolegate operations
pub type Result<T> = std::result::Result<T, RolegateError>;

/// Convert any storage-layer error to RolegateError
pub fn err<E: std::error::Error>(e: E) -> RolegateError {
    RolegateError::Storage(e.to_string())
}
