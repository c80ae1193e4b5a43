//! Error types for the ember runtime.

use thiserror::Error;

/// Errors that can occur while configuring or running interpreter instances.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The embedded Lua runtime rejected an operation.
    #[error("Lua error: {0}")]
    Lua(#[from] mlua::Error),

    /// A capability namespace would overwrite an existing global.
    #[error("Binding collision: global '{0}' is already defined")]
    BindingCollision(String),

    /// A registered capability module was not bound into an instance.
    #[error("Capability module '{0}' is registered but was not bound")]
    UnboundModule(String),

    /// The host executable's own directory could not be resolved.
    #[error("Cannot resolve executable location: {0}")]
    ExecutableLocation(String),

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A capability needs a host service that was not provided.
    #[error("{0} service is not configured")]
    ServiceUnavailable(&'static str),

    /// A host service failed to satisfy a request.
    #[error("Service error: {0}")]
    Service(String),

    /// A request-scoped capability was called outside a script invocation.
    #[error("No active request on this instance")]
    NoActiveRequest,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

impl From<RuntimeError> for mlua::Error {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Lua(inner) => inner,
            other => mlua::Error::external(other),
        }
    }
}
