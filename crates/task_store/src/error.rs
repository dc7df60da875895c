//! Task store error types.

use thiserror::Error;

/// Errors that can occur during task store operations.
#[derive(Debug, Error)]
pub enum TaskStoreError {
    /// Entity not found.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The configured DAO type does not exist.
    #[error("type {dao_type} not found")]
    DaoTypeNotFound { dao_type: String },

    /// No connector is registered under this name.
    #[error("connector {kind} {name} not found")]
    ConnectorNotFound { kind: &'static str, name: String },

    /// Malformed or mistyped payload.
    #[error("invalid payload: {0}")]
    Invalid(String),

    /// The backend does not support this operation.
    #[error("feature not implemented")]
    FeatureNotImplemented,

    /// A write touched an unexpected number of records.
    #[error("expected {expected} affected row(s), got {actual}")]
    ConstraintViolation { expected: u64, actual: u64 },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Document store error.
    #[error("Document store error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// Rolling back a failed transaction failed as well.
    #[error("can't rollback the tx: {source} (original error: {original})")]
    Rollback {
        #[source]
        source: sqlx::Error,
        original: Box<TaskStoreError>,
    },
}

impl TaskStoreError {
    /// Creates a not found error.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a connector not found error.
    pub fn connector_not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::ConnectorNotFound {
            kind,
            name: name.into(),
        }
    }

    /// Returns true if the error means a record, type or connector is absent.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. }
            | Self::DaoTypeNotFound { .. }
            | Self::ConnectorNotFound { .. } => true,
            Self::Rollback { original, .. } => original.is_not_found(),
            _ => false,
        }
    }
}

impl From<entities::PayloadError> for TaskStoreError {
    fn from(err: entities::PayloadError) -> Self {
        Self::Invalid(err.to_string())
    }
}

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;
