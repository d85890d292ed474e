//! Error types for repository access

use thiserror::Error;

/// Failure reported by a storage backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// Query could not be executed
    #[error("Query on \"{table}\" failed: {message}")]
    Query { table: &'static str, message: String },

    /// Write was rejected by the storage layer
    #[error("Write to \"{table}\" failed: {message}")]
    Write { table: &'static str, message: String },

    /// Backend is unreachable
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Create a query error
    pub fn query(table: &'static str, message: impl Into<String>) -> Self {
        Self::Query {
            table,
            message: message.into(),
        }
    }

    /// Create a write error
    pub fn write(table: &'static str, message: impl Into<String>) -> Self {
        Self::Write {
            table,
            message: message.into(),
        }
    }
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;
