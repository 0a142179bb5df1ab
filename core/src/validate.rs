//! Schema and row validation.
//!
//! Checks table definitions and row maps against the declared columns
//! before anything reaches storage, catching bad identifiers, duplicate
//! columns, undeclared or missing columns, and kind mismatches.
//!
//! # Examples
//!
//! ```
//! use table_controller_core::*;
//!
//! let columns = vec![ColumnDescriptor::text("name"), ColumnDescriptor::integer("age")];
//! assert!(validate_columns(&columns).is_ok());
//!
//! let mut row = Row::new();
//! row.insert("name".into(), Value::from("Jon"));
//! row.insert("age".into(), Value::from("forty"));
//! assert!(matches!(
//!     validate_row(&columns, &row),
//!     Err(ValidationError::TypeMismatch { .. })
//! ));
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::{ColumnDescriptor, DataType, Row, Value};

/// Names SQLite resolves to the implicit row id; a column with one of
/// these names would shadow row ordering.
const ROWID_ALIASES: &[&str] = &["rowid", "oid", "_rowid_"];

/// Table/row validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Table or column name is empty.
    #[error("identifier cannot be empty")]
    EmptyIdentifier,
    /// Name contains characters other than ASCII alphanumerics and
    /// underscores, or starts with a digit.
    #[error("invalid identifier '{0}': must be ASCII alphanumerics and underscores, not starting with a digit")]
    InvalidIdentifier(String),
    /// Name is reserved by SQLite.
    #[error("identifier '{0}' is reserved")]
    ReservedIdentifier(String),
    /// Table declared without any column.
    #[error("table must declare at least one column")]
    EmptySchema,
    /// Two columns share a name (compared case-insensitively).
    #[error("duplicate column: {0}")]
    DuplicateColumn(String),
    /// Row or request names a column the table does not declare.
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    /// Row omits a declared column.
    #[error("missing value for column: {0}")]
    MissingColumn(String),
    /// Value kind differs from the column's declared kind.
    #[error("column '{column}' expects {expected}, got {found}")]
    TypeMismatch {
        column: String,
        expected: DataType,
        found: DataType,
    },
    /// Real value is NaN, which SQLite would store as NULL.
    #[error("column '{0}' cannot hold NaN")]
    NotANumber(String),
}

/// Validates a table or column identifier.
///
/// Identifiers are also quoted when interpolated into SQL; this check
/// keeps them portable and free of anything that would need escaping.
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    let Some(first) = name.chars().next() else {
        return Err(ValidationError::EmptyIdentifier);
    };
    if first.is_ascii_digit() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidIdentifier(name.to_string()));
    }
    if name.to_ascii_lowercase().starts_with("sqlite_") {
        return Err(ValidationError::ReservedIdentifier(name.to_string()));
    }
    Ok(())
}

/// Validates an ordered column list for a table definition.
///
/// # Examples
///
/// ```
/// use table_controller_core::*;
///
/// let dup = vec![ColumnDescriptor::text("name"), ColumnDescriptor::blob("NAME")];
/// assert_eq!(
///     validate_columns(&dup),
///     Err(ValidationError::DuplicateColumn("NAME".into()))
/// );
/// ```
pub fn validate_columns(columns: &[ColumnDescriptor]) -> Result<(), ValidationError> {
    if columns.is_empty() {
        return Err(ValidationError::EmptySchema);
    }

    let mut seen: HashSet<String> = HashSet::new();
    for column in columns {
        let name = column.name();
        validate_identifier(name)?;
        let folded = name.to_ascii_lowercase();
        if ROWID_ALIASES.contains(&folded.as_str()) {
            return Err(ValidationError::ReservedIdentifier(name.to_string()));
        }
        if !seen.insert(folded) {
            return Err(ValidationError::DuplicateColumn(name.to_string()));
        }
    }
    Ok(())
}

/// Validates a row against the declared columns.
///
/// Every key must be declared, every declared column must be present, and
/// each value's kind must equal its column's kind exactly (a `Null` value
/// is only accepted by a `Null` column). Real values must not be NaN.
/// Undeclared keys are reported
/// before missing columns; the remaining checks follow column order.
pub fn validate_row(columns: &[ColumnDescriptor], row: &Row) -> Result<(), ValidationError> {
    if let Some(unknown) = row
        .keys()
        .find(|key| !columns.iter().any(|c| c.name() == key.as_str()))
    {
        return Err(ValidationError::UnknownColumn(unknown.clone()));
    }

    for column in columns {
        let value = row
            .get(column.name())
            .ok_or_else(|| ValidationError::MissingColumn(column.name().to_string()))?;
        check_kind(column, value.data_type())?;
        if matches!(value, Value::Real(r) if r.is_nan()) {
            return Err(ValidationError::NotANumber(column.name().to_string()));
        }
    }
    Ok(())
}

/// Checks that `found` matches the declared kind of `column`.
pub fn check_kind(column: &ColumnDescriptor, found: DataType) -> Result<(), ValidationError> {
    if column.data_type() != found {
        return Err(ValidationError::TypeMismatch {
            column: column.name().to_string(),
            expected: column.data_type(),
            found,
        });
    }
    Ok(())
}
