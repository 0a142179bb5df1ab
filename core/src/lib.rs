//! Core types for schema-typed tables.
//!
//! This crate defines the backend-independent model of a table:
//!
//! - [`DataType`]: the five primitive column kinds (null, integer, real,
//!   text, blob).
//! - [`Value`]: a tagged cell value whose variant mirrors a [`DataType`].
//! - [`ColumnDescriptor`]: a column's name and declared kind.
//! - [`Row`]: a map from column name to [`Value`].
//! - [`TableConfig`]: a YAML/JSON description of a table and its file.
//!
//! Validation ([`validate_columns`], [`validate_row`]) rejects bad
//! identifiers, duplicate columns, undeclared or missing columns, and kind
//! mismatches before a row ever reaches storage.
//!
//! # Example
//!
//! ```
//! use table_controller_core::*;
//!
//! let columns = vec![
//!     ColumnDescriptor::text("name"),
//!     ColumnDescriptor::integer("age"),
//! ];
//! assert!(validate_columns(&columns).is_ok());
//!
//! let mut row = Row::new();
//! row.insert("name".into(), Value::from("Jonathan"));
//! row.insert("age".into(), Value::from(41i64));
//! assert!(validate_row(&columns, &row).is_ok());
//! ```

mod config;
mod types;
mod validate;

pub use config::{ConfigError, ReconcilePolicy, TableConfig};
pub use types::*;
pub use validate::{
    ValidationError, check_kind, validate_columns, validate_identifier, validate_row,
};
