//! Domain error types.

use record_store::RecordStoreError;
use thiserror::Error;

use crate::value_objects::ProductId;

/// Stable error categories exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    NotFound,
    PermissionDenied,
    InsufficientStock,
    InvalidState,
    InvalidTransition,
    Conflict,
    Internal,
}

impl ErrorKind {
    /// Returns the wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::NotFound => "not_found",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::InsufficientStock => "insufficient_stock",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::InvalidTransition => "invalid_transition",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Internal => "internal",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed or missing input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// The actor does not own the entity or lacks the required role.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Not enough stock to satisfy an order.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// The entity is not in a state that allows the operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The requested status change is not an edge of the state machine.
    #[error("Invalid {entity} transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// Concurrent writers kept winning, or a unique value is already taken.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An error occurred in the record store.
    #[error("Record store error: {0}")]
    Store(#[from] RecordStoreError),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns the stable category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            DomainError::NotFound { .. } => ErrorKind::NotFound,
            DomainError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            DomainError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            DomainError::InvalidState(_) => ErrorKind::InvalidState,
            DomainError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            DomainError::Conflict(_) => ErrorKind::Conflict,
            DomainError::Store(e) if e.is_retryable() => ErrorKind::Conflict,
            DomainError::Store(_) | DomainError::Serialization(_) => ErrorKind::Internal,
        }
    }
}
