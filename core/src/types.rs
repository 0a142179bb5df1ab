//! Type definitions for schema-typed tables.
//!
//! This module defines the data model shared by every storage backend:
//! the five primitive column kinds, the tagged [`Value`] that rows carry,
//! and the [`ColumnDescriptor`] that pairs a column name with its kind.
//! The types are designed for serialization with [`serde`] so table
//! definitions can live in configuration files.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Primitive storage kind of a column.
///
/// Each kind maps to one SQLite storage class and to exactly one
/// [`Value`] variant.
///
/// # Examples
///
/// ```
/// use table_controller_core::DataType;
///
/// assert_eq!(DataType::Text.sql_type(), "TEXT");
/// assert_eq!(DataType::from_sql_type("integer"), Some(DataType::Integer));
/// assert_eq!(DataType::Real.to_string(), "real");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Column only ever holds NULL.
    Null,
    /// 64-bit signed integer.
    Integer,
    /// 64-bit floating point number.
    Real,
    /// UTF-8 text.
    Text,
    /// Opaque byte sequence.
    Blob,
}

impl DataType {
    /// All kinds, in declaration order.
    pub const ALL: [DataType; 5] = [
        DataType::Null,
        DataType::Integer,
        DataType::Real,
        DataType::Text,
        DataType::Blob,
    ];

    /// Returns the declared SQL type used when creating a column of this kind.
    ///
    /// `Null` columns are declared `NONE`: a bare `NULL` after a column name
    /// parses as a constraint, not a type.
    pub fn sql_type(self) -> &'static str {
        match self {
            DataType::Null => "NONE",
            DataType::Integer => "INTEGER",
            DataType::Real => "REAL",
            DataType::Text => "TEXT",
            DataType::Blob => "BLOB",
        }
    }

    /// Parses a declared SQL type back into a kind, ignoring case.
    ///
    /// Returns `None` for declared types this crate never writes
    /// (e.g. `VARCHAR(20)`), so foreign tables are not silently adopted.
    pub fn from_sql_type(declared: &str) -> Option<Self> {
        let declared = declared.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.sql_type().eq_ignore_ascii_case(declared))
    }

    /// Lowercase name, as used in configuration files and CLI arguments.
    pub fn name(self) -> &'static str {
        match self {
            DataType::Null => "null",
            DataType::Integer => "integer",
            DataType::Real => "real",
            DataType::Text => "text",
            DataType::Blob => "blob",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single cell value.
///
/// Serialized untagged, so a row renders as a plain JSON object:
/// `null`, integers, floats, strings, and byte arrays.
///
/// # Examples
///
/// ```
/// use table_controller_core::{DataType, Value};
///
/// let v = Value::from("Jonathan");
/// assert_eq!(v.data_type(), DataType::Text);
/// assert_eq!(v.as_text(), Some("Jonathan"));
///
/// let missing: Option<i64> = None;
/// assert!(Value::from(missing).is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// Returns the kind of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Integer(_) => DataType::Integer,
            Value::Real(_) => DataType::Real,
            Value::Text(_) => DataType::Text,
            Value::Blob(_) => DataType::Blob,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// A row keyed by column name.
pub type Row = BTreeMap<String, Value>;

/// Schema entry declaring one column's name and storage kind.
///
/// Immutable once built; the owning table keeps descriptors in a fixed
/// order that defines the positional layout of the stored table.
///
/// # Examples
///
/// ```
/// use table_controller_core::{ColumnDescriptor, DataType};
///
/// let col = ColumnDescriptor::new("name", DataType::Text);
/// assert_eq!(col.name(), "name");
/// assert_eq!(col.data_type(), DataType::Text);
/// assert_eq!(col, ColumnDescriptor::text("name"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    name: String,
    #[serde(rename = "type")]
    data_type: DataType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    pub fn null(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Null)
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Integer)
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Real)
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Text)
    }

    pub fn blob(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Blob)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}
