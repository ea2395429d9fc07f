//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BridgeError`]
//! at port boundaries via `From`.

use crate::id::HueId;

/// Base error for every fallible bridge operation.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Caller-supplied data failed a domain invariant.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A lookup by identifier found nothing.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The upstream hub is unreachable or rejected the request.
    #[error("hub unavailable")]
    Hub(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration persistence failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A bridge identifier is used by more than one virtual device.
    #[error("bridge id {0} is assigned to more than one virtual device")]
    DuplicateHueId(HueId),

    /// A virtual device has no hub entity reference.
    #[error("virtual device {name:?} has an empty entity id")]
    EmptyEntityId {
        /// Display name of the offending device.
        name: String,
    },

    /// A bridge identifier could not be parsed.
    #[error("invalid bridge id {0:?}")]
    InvalidHueId(String),

    /// A request body could not be understood.
    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

/// Returned when a lookup by identifier fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of the missing resource (e.g. `"Light"`).
    pub entity: &'static str,
    /// Identifier that was looked up.
    pub id: String,
}
