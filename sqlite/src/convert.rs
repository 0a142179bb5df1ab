//! Conversion between [`Value`] and SQLite values.
//!
//! Values are bound through [`rusqlite::types::Value`] and read back from
//! [`ValueRef`]. Each storage class maps to exactly one [`Value`] variant,
//! so a validated row reads back equal to what was inserted.

use rusqlite::Row as SqlRow;
use rusqlite::types::{Value as SqlValue, ValueRef};
use table_controller_core::{ColumnDescriptor, Row, Value};

use crate::error::{Result, TableError};

/// Converts a [`Value`] into an owned SQLite value for binding.
pub(crate) fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(r) => SqlValue::Real(*r),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Blob(b) => SqlValue::Blob(b.clone()),
    }
}

/// Converts a borrowed SQLite value into a [`Value`].
///
/// # Errors
///
/// Returns [`TableError::ConversionError`] if a text cell is not valid UTF-8.
pub(crate) fn from_sql(value: ValueRef<'_>) -> Result<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(bytes) => Value::Text(
            std::str::from_utf8(bytes)
                .map_err(|e| TableError::ConversionError(format!("invalid UTF-8 text: {e}")))?
                .to_string(),
        ),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    })
}

/// Reads one cell of a result row.
pub(crate) fn read_cell(row: &SqlRow<'_>, idx: usize) -> Result<Value> {
    from_sql(row.get_ref(idx)?)
}

/// Builds a [`Row`] from a result row whose columns follow `columns` order.
pub(crate) fn read_row(row: &SqlRow<'_>, columns: &[ColumnDescriptor]) -> Result<Row> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, column)| Ok((column.name().to_string(), read_cell(row, idx)?)))
        .collect()
}

/// Orders a validated row's values by declared column order for binding.
pub(crate) fn row_params(columns: &[ColumnDescriptor], row: &Row) -> Vec<SqlValue> {
    columns
        .iter()
        .map(|column| row.get(column.name()).map_or(SqlValue::Null, to_sql))
        .collect()
}
