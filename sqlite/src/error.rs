//! Error types for table controller operations.
//!
//! Provides a unified error type covering database access, schema
//! reconciliation, row validation, and lookups, plus a coarse
//! [`ErrorKind`] so callers can tell "not found" from "invalid input".

use table_controller_core::{ConfigError, DataType, ValidationError};
use thiserror::Error;

/// Errors that can occur while opening or using a table controller.
#[derive(Debug, Error)]
pub enum TableError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Row or table definition failed validation.
    #[error("validation error: {0}")]
    ValidationError(#[from] ValidationError),

    /// Table configuration could not be loaded.
    #[error("config error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Existing table layout is incompatible with the declared columns.
    #[error("schema mismatch for table '{table}': {reason}")]
    SchemaMismatch { table: String, reason: String },

    /// Search value kind differs from the requested column kind.
    #[error("search value is {found} but {expected} columns were requested")]
    SearchTypeMismatch { expected: DataType, found: DataType },

    /// Requested column is not declared by the table.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// Row index is past the end of the table.
    #[error("row {index} not found (table has {row_count} rows)")]
    RowNotFound { index: usize, row_count: usize },

    /// Row span is malformed.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// Stored value could not be converted.
    #[error("conversion error: {0}")]
    ConversionError(String),
}

/// Coarse classification of a [`TableError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied something malformed (bad identifier, kind
    /// mismatch, undeclared or missing row key, bad range).
    InvalidInput,
    /// The caller asked for something that does not exist (row index out
    /// of range, undeclared column name).
    NotFound,
    /// The stored table disagrees with the declared columns.
    Schema,
    /// The storage engine or filesystem failed.
    Storage,
}

impl TableError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TableError::ColumnNotFound(_) | TableError::RowNotFound { .. } => ErrorKind::NotFound,
            TableError::ValidationError(_)
            | TableError::SearchTypeMismatch { .. }
            | TableError::InvalidRange(_) => ErrorKind::InvalidInput,
            TableError::SchemaMismatch { .. } => ErrorKind::Schema,
            TableError::DatabaseError(_)
            | TableError::ConfigError(_)
            | TableError::ConversionError(_) => ErrorKind::Storage,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

/// Convenience alias for results with [`TableError`].
pub type Result<T> = std::result::Result<T, TableError>;
