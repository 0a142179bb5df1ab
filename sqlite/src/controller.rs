//! Schema-typed access to one SQLite table.
//!
//! Provides [`TableController`], which owns a connection to one database
//! file and exposes row insertion, positional lookup, search, and column
//! reads for a single table whose columns are fixed at construction.
//! Rows cross the boundary as [`Row`] maps and are validated against the
//! declared columns before anything is written.
//!
//! Row indexes are zero-based positions in insertion order. Ranged column
//! reads take a [`RowSpan`], which is one-based.
//!
//! # Example
//!
//! ```
//! use table_controller_core::{ColumnDescriptor, DataType, Row, Value};
//! use table_controller_sqlite::TableController;
//!
//! let columns = vec![ColumnDescriptor::text("name"), ColumnDescriptor::integer("age")];
//! let table = TableController::open_in_memory("contacts", columns).unwrap();
//!
//! let mut row = Row::new();
//! row.insert("name".into(), Value::from("Jonathan"));
//! row.insert("age".into(), Value::from(41i64));
//! assert_eq!(table.insert_row(&row).unwrap(), 0);
//!
//! assert_eq!(table.get_row(0).unwrap(), row);
//! assert_eq!(table.find_row_indexes(&Value::from("%jon%"), DataType::Text).unwrap(), vec![0]);
//! assert_eq!(table.row_count().unwrap(), 1);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, params, params_from_iter};
use table_controller_core::{
    ColumnDescriptor, DataType, ReconcilePolicy, Row, TableConfig, Value, validate_columns,
    validate_identifier, validate_row,
};
use tracing::{debug, info};

use crate::convert::{read_cell, read_row, row_params, to_sql};
use crate::error::{Result, TableError};
use crate::reconcile::{self, ReconcileOutcome, TableStatus};
use crate::schema::quote_identifier;

/// Options applied when a controller opens its database.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use table_controller_core::ReconcilePolicy;
/// use table_controller_sqlite::OpenOptions;
///
/// let options = OpenOptions::default()
///     .reconcile(ReconcilePolicy::AddMissingColumns)
///     .busy_timeout(Duration::from_secs(5));
/// assert_eq!(options.reconcile_policy(), ReconcilePolicy::AddMissingColumns);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    reconcile: ReconcilePolicy,
    busy_timeout: Option<Duration>,
}

impl OpenOptions {
    /// Sets how an existing table with a different layout is handled.
    pub fn reconcile(mut self, policy: ReconcilePolicy) -> Self {
        self.reconcile = policy;
        self
    }

    /// Sets how long SQLite waits on a locked database before failing.
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    pub fn reconcile_policy(&self) -> ReconcilePolicy {
        self.reconcile
    }
}

impl From<&TableConfig> for OpenOptions {
    fn from(config: &TableConfig) -> Self {
        let options = OpenOptions::default().reconcile(config.reconcile);
        match config.busy_timeout_ms {
            Some(ms) => options.busy_timeout(Duration::from_millis(ms)),
            None => options,
        }
    }
}

/// A one-based span of rows: `first == 1` is the first row.
///
/// Used by [`TableController::column_values_in_range`]. Unlike row
/// indexes, which start at zero, spans count rows from one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    /// One-based position of the first row in the span.
    pub first: usize,
    /// Number of rows in the span.
    pub count: usize,
}

impl RowSpan {
    pub fn new(first: usize, count: usize) -> Self {
        Self { first, count }
    }
}

/// Controller for one table in one SQLite database file.
///
/// Owns its connection for its whole lifetime; dropping the controller
/// (or calling [`close`](Self::close)) releases the file. All operations
/// block until SQLite completes them. The controller is `Send` but not
/// `Sync`.
#[derive(Debug)]
pub struct TableController {
    conn: Connection,
    path: Option<PathBuf>,
    table: String,
    columns: Vec<ColumnDescriptor>,
    outcome: ReconcileOutcome,
    /// Quoted table name.
    quoted_table: String,
    /// Quoted declared columns, comma separated, in declared order.
    select_list: String,
}

impl TableController {
    /// Opens (or creates) `path` and binds the controller to `table`.
    ///
    /// Uses the strict reconciliation policy: an existing table must have
    /// exactly the declared columns.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad table name or column list, a
    /// database error if the file cannot be opened or created, and
    /// [`TableError::SchemaMismatch`] if an existing table is incompatible.
    pub fn open(
        path: impl AsRef<Path>,
        table: impl Into<String>,
        columns: Vec<ColumnDescriptor>,
    ) -> Result<Self> {
        Self::open_with(path, table, columns, OpenOptions::default())
    }

    /// Opens (or creates) `path` with explicit [`OpenOptions`].
    pub fn open_with(
        path: impl AsRef<Path>,
        table: impl Into<String>,
        columns: Vec<ColumnDescriptor>,
        options: OpenOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        let table = table.into();
        validate_definition(&table, &columns)?;

        let conn = Connection::open(path)?;
        info!(path = %path.display(), table = %table, "opened database");
        Self::init(conn, Some(path.to_path_buf()), table, columns, options)
    }

    /// Binds a controller to a private in-memory database.
    pub fn open_in_memory(table: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Result<Self> {
        let table = table.into();
        validate_definition(&table, &columns)?;

        let conn = Connection::open_in_memory()?;
        Self::init(conn, None, table, columns, OpenOptions::default())
    }

    /// Opens the controller described by a [`TableConfig`].
    pub fn from_config(config: &TableConfig) -> Result<Self> {
        Self::open_with(
            &config.path,
            config.table.clone(),
            config.columns.clone(),
            OpenOptions::from(config),
        )
    }

    fn init(
        mut conn: Connection,
        path: Option<PathBuf>,
        table: String,
        columns: Vec<ColumnDescriptor>,
        options: OpenOptions,
    ) -> Result<Self> {
        if let Some(timeout) = options.busy_timeout {
            conn.busy_timeout(timeout)?;
        }
        let outcome = reconcile::reconcile(&mut conn, &table, &columns, options.reconcile)?;

        let quoted_table = quote_identifier(&table);
        let select_list = columns
            .iter()
            .map(|c| quote_identifier(c.name()))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            conn,
            path,
            table,
            columns,
            outcome,
            quoted_table,
            select_list,
        })
    }

    /// Declared columns, in table order.
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Database file path, or `None` for an in-memory controller.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// What opening the controller did to the stored table.
    pub fn reconcile_outcome(&self) -> &ReconcileOutcome {
        &self.outcome
    }

    /// Appends a row and returns its zero-based index.
    ///
    /// The row must name every declared column and nothing else, and each
    /// value's kind must equal its column's kind. Nothing is written when
    /// validation fails.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ValidationError`] naming the offending column
    /// on an undeclared key, a missing column, or a kind mismatch.
    pub fn insert_row(&self, row: &Row) -> Result<usize> {
        validate_row(&self.columns, row)?;

        let placeholders = (1..=self.columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            self.quoted_table, self.select_list
        );

        let tx = self.conn.unchecked_transaction()?;
        tx.prepare_cached(&sql)?
            .execute(params_from_iter(row_params(&self.columns, row)))?;
        let index = reconcile::count_rows(&tx, &self.table)? - 1;
        tx.commit()?;

        debug!(table = %self.table, index, "inserted row");
        Ok(index)
    }

    /// Returns the row at zero-based `index`.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::RowNotFound`] if `index` is past the last row.
    pub fn get_row(&self, index: usize) -> Result<Row> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {} FROM {} ORDER BY rowid LIMIT 1 OFFSET ?1",
            self.select_list, self.quoted_table
        ))?;
        let mut rows = stmt.query(params![sql_count(index)])?;
        match rows.next()? {
            Some(row) => read_row(row, &self.columns),
            None => Err(TableError::RowNotFound {
                index,
                row_count: self.row_count()?,
            }),
        }
    }

    /// Returns every row, in index order.
    pub fn rows(&self) -> Result<Vec<Row>> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {} FROM {} ORDER BY rowid",
            self.select_list, self.quoted_table
        ))?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(read_row(row, &self.columns)?);
        }
        Ok(out)
    }

    /// Returns the indexes of rows where any column of kind `column_type`
    /// matches `value`, in index order.
    ///
    /// Text columns match with SQL `LIKE`: `%` matches any run of
    /// characters and `_` any single character. Only ASCII letters compare
    /// case-insensitively, so `"%jon%"` matches `"JONATHAN"` but
    /// `"%émilie%"` does not match `"ÉMILIE"`; there is no Unicode case
    /// folding. Null columns match when NULL. Other kinds compare for
    /// equality. A table with no column of that kind yields no indexes.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::SearchTypeMismatch`] if `value` is not of
    /// kind `column_type`.
    pub fn find_row_indexes(&self, value: &Value, column_type: DataType) -> Result<Vec<usize>> {
        if value.data_type() != column_type {
            return Err(TableError::SearchTypeMismatch {
                expected: column_type,
                found: value.data_type(),
            });
        }

        let predicate = self
            .columns
            .iter()
            .filter(|c| c.data_type() == column_type)
            .map(|c| {
                let name = quote_identifier(c.name());
                match column_type {
                    DataType::Text => format!("{name} LIKE ?1"),
                    DataType::Null => format!("{name} IS NULL"),
                    _ => format!("{name} = ?1"),
                }
            })
            .collect::<Vec<_>>()
            .join(" OR ");
        if predicate.is_empty() {
            return Ok(Vec::new());
        }

        let params: Vec<SqlValue> = match column_type {
            DataType::Null => Vec::new(),
            _ => vec![to_sql(value)],
        };
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT coalesce({predicate}, 0) FROM {} ORDER BY rowid",
            self.quoted_table
        ))?;
        let mut rows = stmt.query(params_from_iter(params))?;

        let mut indexes = Vec::new();
        let mut index = 0usize;
        while let Some(row) = rows.next()? {
            if row.get::<_, bool>(0)? {
                indexes.push(index);
            }
            index += 1;
        }

        debug!(table = %self.table, %column_type, matches = indexes.len(), "searched rows");
        Ok(indexes)
    }

    /// Returns every value of `column`, in row index order.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::ColumnNotFound`] if `column` is not declared.
    pub fn column_values(&self, column: &str) -> Result<Vec<Value>> {
        let column = self.column(column)?;
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {} FROM {} ORDER BY rowid",
            quote_identifier(column.name()),
            self.quoted_table
        ))?;
        collect_column(stmt.query([])?)
    }

    /// Returns the values of `column` for the rows in a one-based span.
    ///
    /// A span reaching past the last row is truncated; one starting past
    /// the last row, or with `count == 0`, yields no values.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::InvalidRange`] if `span.first` is zero, and
    /// [`TableError::ColumnNotFound`] if `column` is not declared.
    pub fn column_values_in_range(&self, column: &str, span: RowSpan) -> Result<Vec<Value>> {
        let column = self.column(column)?;
        if span.first == 0 {
            return Err(TableError::InvalidRange(
                "row spans are one-based; first must be at least 1".to_string(),
            ));
        }
        if span.count == 0 {
            return Ok(Vec::new());
        }

        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {} FROM {} ORDER BY rowid LIMIT ?1 OFFSET ?2",
            quote_identifier(column.name()),
            self.quoted_table
        ))?;
        collect_column(stmt.query(params![sql_count(span.count), sql_count(span.first - 1)])?)
    }

    /// Returns the number of rows in the table.
    pub fn row_count(&self) -> Result<usize> {
        reconcile::count_rows(&self.conn, &self.table)
    }

    /// Reports whether the table exists, its row count, and its stored
    /// column layout.
    pub fn status(&self) -> Result<TableStatus> {
        reconcile::status(&self.conn, &self.table)
    }

    /// Closes the connection, reporting any error SQLite raises while
    /// releasing the file.
    pub fn close(self) -> Result<()> {
        let table = self.table;
        self.conn.close().map_err(|(_, e)| TableError::from(e))?;
        debug!(table = %table, "closed database");
        Ok(())
    }

    fn column(&self, name: &str) -> Result<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.name() == name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }
}

fn validate_definition(table: &str, columns: &[ColumnDescriptor]) -> Result<()> {
    validate_identifier(table)?;
    validate_columns(columns)?;
    Ok(())
}

fn collect_column(mut rows: rusqlite::Rows<'_>) -> Result<Vec<Value>> {
    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        values.push(read_cell(row, 0)?);
    }
    Ok(values)
}

/// Clamps a row count or offset into SQLite's integer range.
fn sql_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
