//! Error types for partial import operations.
//!
//! Only store-level and mutation-phase problems are errors. Conflicts and
//! malformed items found while validating a bundle are data and are reported
//! through [`crate::ImportOutcome::Rejected`] instead.

use crate::resource::ResourceKind;
use crate::storage::StorageError;

/// Main error type for the import engine.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The store detected a natural key collision while inserting
    #[error("{kind} '{key}' already exists")]
    DuplicateKey { kind: ResourceKind, key: String },

    /// The store already holds a resource under the requested internal id
    #[error("{kind} id '{id}' is already in use")]
    IdTaken { kind: ResourceKind, id: String },

    /// A resource expected to exist could not be located
    #[error("{kind} '{key}' not found")]
    NotFound { kind: ResourceKind, key: String },

    /// A definition could not be turned into a stored resource
    #[error("Invalid {kind} definition: {message}")]
    InvalidDefinition { kind: ResourceKind, message: String },

    /// The store could not open or commit the import transaction
    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    /// Errors from the storage backend
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid request format or parameters
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Internal engine errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl ImportError {
    /// Create a duplicate key error.
    pub fn duplicate_key(kind: ResourceKind, key: impl Into<String>) -> Self {
        Self::DuplicateKey {
            kind,
            key: key.into(),
        }
    }

    /// Create an internal id collision error.
    pub fn id_taken(kind: ResourceKind, id: impl Into<String>) -> Self {
        Self::IdTaken {
            kind,
            id: id.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(kind: ResourceKind, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// Create an invalid definition error.
    pub fn invalid_definition(kind: ResourceKind, message: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            kind,
            message: message.into(),
        }
    }

    /// Create a store unavailable error.
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Create an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the error means the store itself could not be used.
    pub fn is_store_unavailable(&self) -> bool {
        match self {
            ImportError::StoreUnavailable { .. } => true,
            ImportError::Storage(e) => e.is_unavailable(),
            _ => false,
        }
    }

    /// Stable machine-readable code for transport responses.
    pub fn code(&self) -> &'static str {
        match self {
            ImportError::DuplicateKey { .. } => "duplicate_key",
            ImportError::IdTaken { .. } => "id_taken",
            ImportError::NotFound { .. } => "not_found",
            ImportError::InvalidDefinition { .. } => "invalid_definition",
            ImportError::StoreUnavailable { .. } => "store_unavailable",
            ImportError::Storage(e) if e.is_unavailable() => "store_unavailable",
            ImportError::Storage(_) => "mutation_failure",
            ImportError::Json(_) => "invalid_json",
            ImportError::InvalidRequest { .. } => "invalid_request",
            ImportError::Internal { .. } => "internal_error",
        }
    }
}

/// Result type alias for import operations.
pub type ImportResult<T> = Result<T, ImportError>;
