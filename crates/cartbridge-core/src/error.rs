//! Error types for the Cartbridge core library
//!
//! This module defines the crate-wide error type. Errors raised inside a single
//! transformation run live in [`crate::mapping::MappingError`] and errors raised
//! by migration status handling live in [`crate::migration::LifecycleError`];
//! both convert into [`Error`] so callers can use `?` across module boundaries.

use crate::mapping::{MappingError, RuleFailure};
use crate::migration::LifecycleError;
use thiserror::Error;

/// Main error type for Cartbridge operations
#[derive(Error, Debug)]
pub enum Error {
    /// A transformation run aborted on a rule
    #[error("Mapping failed: {0}")]
    Mapping(#[from] RuleFailure),

    /// Path or transformation error outside of a pipeline run
    #[error("Transformation error: {0}")]
    Transformation(#[from] MappingError),

    /// Migration lifecycle errors
    #[error("Migration lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    /// Validation errors for dataflows, connectors and field mappings
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// A referenced record does not exist
    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a validation error for a named field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
