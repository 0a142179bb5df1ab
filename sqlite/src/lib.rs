//! Schema-typed table controller over an embedded SQLite database.
//!
//! This crate binds one table in one SQLite file to a fixed, ordered list
//! of [`ColumnDescriptor`](table_controller_core::ColumnDescriptor)s and
//! exposes row insertion, positional lookup, wildcard search, and column
//! reads. Rows are validated against the declared kinds before they reach
//! SQLite; storage, durability, and query execution are SQLite's.
//!
//! # Architecture
//!
//! The crate is organized into four modules:
//!
//! - **`schema`**: `CREATE TABLE` / `ALTER TABLE` generation and table introspection
//! - **`reconcile`**: Creating the table or reconciling an existing one on open
//! - **`convert`**: `Value` ↔ SQLite value conversion
//! - **`controller`**: The [`TableController`] itself
//!
//! # Quick start
//!
//! ```no_run
//! use table_controller_core::{ColumnDescriptor, DataType, Row, Value};
//! use table_controller_sqlite::{RowSpan, TableController};
//!
//! let columns = vec![ColumnDescriptor::text("name"), ColumnDescriptor::integer("age")];
//! let table = TableController::open("/var/lib/app/contacts.db", "contacts", columns).unwrap();
//!
//! let mut row = Row::new();
//! row.insert("name".into(), Value::from("Jonathan"));
//! row.insert("age".into(), Value::from(41i64));
//! table.insert_row(&row).unwrap();
//!
//! let hits = table.find_row_indexes(&Value::from("%jon%"), DataType::Text).unwrap();
//! for index in hits {
//!     println!("{:?}", table.get_row(index).unwrap());
//! }
//!
//! // Spans are one-based: the first two names.
//! let names = table.column_values_in_range("name", RowSpan::new(1, 2)).unwrap();
//! println!("{names:?}");
//! ```
//!
//! # Identifiers
//!
//! Table and column names must contain only ASCII alphanumerics and
//! underscores and must not start with a digit. They are quoted whenever
//! they are interpolated into SQL.

mod controller;
mod convert;
mod error;
mod reconcile;
mod schema;

pub use controller::{OpenOptions, RowSpan, TableController};
pub use error::{ErrorKind, Result, TableError};
pub use reconcile::{ReconcileOutcome, TableStatus};
pub use schema::{StoredColumn, generate_add_column_sql, generate_create_table_sql};
