//! Creating the controlled table and reconciling an existing one.
//!
//! When a controller opens a file, the declared columns are compared with
//! what SQLite already stores under the table name. A missing table is
//! created; a matching one is left untouched; anything else is handled by
//! the [`ReconcilePolicy`]. All changes run in one transaction, so a
//! rejected or failed reconciliation leaves the file as it was.
//!
//! # Example
//!
//! ```
//! use table_controller_core::{ColumnDescriptor, ReconcilePolicy};
//! use table_controller_sqlite::{OpenOptions, ReconcileOutcome, TableController};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let path = dir.path().join("contacts.db");
//!
//! let v1 = vec![ColumnDescriptor::text("name")];
//! let table = TableController::open(&path, "contacts", v1).unwrap();
//! assert_eq!(table.reconcile_outcome(), &ReconcileOutcome::Created);
//! drop(table);
//!
//! let v2 = vec![ColumnDescriptor::text("name"), ColumnDescriptor::text("email")];
//! let options = OpenOptions::default().reconcile(ReconcilePolicy::AddMissingColumns);
//! let table = TableController::open_with(&path, "contacts", v2, options).unwrap();
//! assert_eq!(
//!     table.reconcile_outcome(),
//!     &ReconcileOutcome::Extended { added: vec!["email".into()] }
//! );
//! ```

use rusqlite::Connection;
use serde::Serialize;
use table_controller_core::{ColumnDescriptor, ReconcilePolicy};
use tracing::{debug, info, warn};

use crate::error::{Result, TableError};
use crate::schema::{
    StoredColumn, generate_add_column_sql, generate_create_table_sql, quote_identifier,
    stored_columns, stored_object_kind, table_exists,
};

/// What reconciliation did to the stored table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The table did not exist and was created.
    Created,
    /// The stored table already matched the declared columns.
    Matched,
    /// Declared columns missing from the stored table were appended.
    Extended {
        /// Names of the appended columns, in declared order.
        added: Vec<String>,
    },
}

/// Ensures `table` exists with the declared columns.
///
/// # Errors
///
/// Returns [`TableError::SchemaMismatch`] if the stored layout cannot be
/// reconciled under `policy`, or a database error if DDL fails.
pub(crate) fn reconcile(
    conn: &mut Connection,
    table: &str,
    columns: &[ColumnDescriptor],
    policy: ReconcilePolicy,
) -> Result<ReconcileOutcome> {
    let tx = conn.transaction()?;
    if let Some(kind) = stored_object_kind(&tx, table)?.filter(|kind| kind != "table") {
        let reason = format!("'{table}' is a {kind}, not a table");
        warn!(table, %reason, "refusing to bind to a non-table schema object");
        return Err(mismatch(table, reason));
    }
    let stored = stored_columns(&tx, table)?;

    if stored.is_empty() {
        tx.execute_batch(&generate_create_table_sql(table, columns)?)?;
        tx.commit()?;
        info!(table, columns = columns.len(), "created table");
        return Ok(ReconcileOutcome::Created);
    }

    if let Err(reason) = compare_prefix(&stored, columns) {
        warn!(table, %reason, "stored table is incompatible with declared columns");
        return Err(mismatch(table, reason));
    }

    if stored.len() == columns.len() {
        debug!(table, "stored table matches declared columns");
        return Ok(ReconcileOutcome::Matched);
    }

    let missing = &columns[stored.len()..];
    let names: Vec<String> = missing.iter().map(|c| c.name().to_string()).collect();
    match policy {
        ReconcilePolicy::Strict => {
            let reason = format!("declared columns missing from stored table: {}", names.join(", "));
            warn!(table, %reason, "refusing to extend table under strict policy");
            Err(mismatch(table, reason))
        }
        ReconcilePolicy::AddMissingColumns => {
            for column in missing {
                tx.execute_batch(&generate_add_column_sql(table, column)?)?;
            }
            tx.commit()?;
            info!(table, added = ?names, "extended table with missing columns");
            Ok(ReconcileOutcome::Extended { added: names })
        }
    }
}

/// Checks that the stored columns are a position-by-position match for
/// the leading declared columns, and that nothing extra is stored.
fn compare_prefix(
    stored: &[StoredColumn],
    columns: &[ColumnDescriptor],
) -> std::result::Result<(), String> {
    if stored.len() > columns.len() {
        return Err(format!(
            "stored table has {} columns but only {} are declared",
            stored.len(),
            columns.len()
        ));
    }

    for (position, (stored, declared)) in stored.iter().zip(columns).enumerate() {
        if !stored.matches(declared) {
            return Err(format!(
                "column {} is stored as '{}' {} but declared as '{}' {}",
                position + 1,
                stored.name,
                stored.declared_type,
                declared.name(),
                declared.data_type().sql_type()
            ));
        }
    }
    Ok(())
}

fn mismatch(table: &str, reason: String) -> TableError {
    TableError::SchemaMismatch {
        table: table.to_string(),
        reason,
    }
}

/// Snapshot of the stored table.
///
/// Returned by [`TableController::status`](crate::TableController::status).
#[derive(Debug, Clone, Serialize)]
pub struct TableStatus {
    /// Table name.
    pub table: String,
    /// Whether the table exists in the database.
    pub table_exists: bool,
    /// Number of rows stored.
    pub row_count: usize,
    /// Stored column layout, in column order.
    pub columns: Vec<StoredColumn>,
}

/// Reads the current status of `table`.
pub(crate) fn status(conn: &Connection, table: &str) -> Result<TableStatus> {
    if !table_exists(conn, table)? {
        return Ok(TableStatus {
            table: table.to_string(),
            table_exists: false,
            row_count: 0,
            columns: Vec::new(),
        });
    }

    Ok(TableStatus {
        table: table.to_string(),
        table_exists: true,
        row_count: count_rows(conn, table)?,
        columns: stored_columns(conn, table)?,
    })
}

/// Counts rows in a table.
pub(crate) fn count_rows(conn: &Connection, table: &str) -> Result<usize> {
    let mut stmt = conn.prepare(&format!(
        "SELECT COUNT(*) FROM {}",
        quote_identifier(table)
    ))?;
    let count: i64 = stmt.query_row([], |row| row.get(0))?;
    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v1() -> Vec<ColumnDescriptor> {
        vec![ColumnDescriptor::text("name"), ColumnDescriptor::integer("age")]
    }

    fn v2() -> Vec<ColumnDescriptor> {
        let mut columns = v1();
        columns.push(ColumnDescriptor::real("score"));
        columns.push(ColumnDescriptor::blob("avatar"));
        columns
    }

    #[test]
    fn test_status_on_empty_database() {
        let conn = Connection::open_in_memory().unwrap();
        let status = status(&conn, "contacts").unwrap();
        assert!(!status.table_exists);
        assert_eq!(status.row_count, 0);
        assert!(status.columns.is_empty());
    }

    #[test]
    fn test_create_then_match() {
        let mut conn = Connection::open_in_memory().unwrap();
        let policy = ReconcilePolicy::Strict;
        assert_eq!(
            reconcile(&mut conn, "contacts", &v1(), policy).unwrap(),
            ReconcileOutcome::Created
        );
        assert_eq!(
            reconcile(&mut conn, "contacts", &v1(), policy).unwrap(),
            ReconcileOutcome::Matched
        );

        let status = status(&conn, "contacts").unwrap();
        assert!(status.table_exists);
        assert_eq!(status.columns.len(), 2);
        assert_eq!(status.columns[1].declared_type, "INTEGER");
    }

    #[test]
    fn test_strict_rejects_missing_columns() {
        let mut conn = Connection::open_in_memory().unwrap();
        reconcile(&mut conn, "contacts", &v1(), ReconcilePolicy::Strict).unwrap();

        let err = reconcile(&mut conn, "contacts", &v2(), ReconcilePolicy::Strict).unwrap_err();
        match err {
            TableError::SchemaMismatch { table, reason } => {
                assert_eq!(table, "contacts");
                assert!(reason.contains("score, avatar"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(stored_columns(&conn, "contacts").unwrap().len(), 2);
    }

    #[test]
    fn test_add_missing_columns_extends_table() {
        let mut conn = Connection::open_in_memory().unwrap();
        reconcile(&mut conn, "contacts", &v1(), ReconcilePolicy::Strict).unwrap();

        let outcome =
            reconcile(&mut conn, "contacts", &v2(), ReconcilePolicy::AddMissingColumns).unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Extended {
                added: vec!["score".into(), "avatar".into()]
            }
        );
        assert_eq!(stored_columns(&conn, "contacts").unwrap().len(), 4);
    }

    #[test]
    fn test_extra_stored_columns_are_rejected_under_any_policy() {
        let mut conn = Connection::open_in_memory().unwrap();
        reconcile(&mut conn, "contacts", &v2(), ReconcilePolicy::Strict).unwrap();

        for policy in [ReconcilePolicy::Strict, ReconcilePolicy::AddMissingColumns] {
            let err = reconcile(&mut conn, "contacts", &v1(), policy).unwrap_err();
            assert!(matches!(err, TableError::SchemaMismatch { .. }));
        }
    }

    #[test]
    fn test_type_change_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        reconcile(&mut conn, "contacts", &v1(), ReconcilePolicy::Strict).unwrap();

        let changed = vec![ColumnDescriptor::text("name"), ColumnDescriptor::text("age")];
        let err = reconcile(&mut conn, "contacts", &changed, ReconcilePolicy::AddMissingColumns)
            .unwrap_err();
        match err {
            TableError::SchemaMismatch { reason, .. } => {
                assert!(reason.contains("column 2"), "{reason}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_foreign_table_is_not_adopted() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE contacts (name VARCHAR(40), age INTEGER);")
            .unwrap();
        let err = reconcile(&mut conn, "contacts", &v1(), ReconcilePolicy::Strict).unwrap_err();
        assert!(matches!(err, TableError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_count_rows() {
        let mut conn = Connection::open_in_memory().unwrap();
        reconcile(&mut conn, "contacts", &v1(), ReconcilePolicy::Strict).unwrap();
        conn.execute("INSERT INTO contacts VALUES ('a', 1), ('b', 2)", [])
            .unwrap();
        assert_eq!(count_rows(&conn, "contacts").unwrap(), 2);
    }

    #[test]
    fn test_view_is_not_adopted() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE base (name TEXT); CREATE VIEW contacts AS SELECT name FROM base;",
        )
        .unwrap();
        let columns = vec![ColumnDescriptor::text("name")];
        match reconcile(&mut conn, "contacts", &columns, ReconcilePolicy::AddMissingColumns) {
            Err(TableError::SchemaMismatch { reason, .. }) => {
                assert!(reason.contains("view"), "{reason}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_status_ignores_name_case() {
        let mut conn = Connection::open_in_memory().unwrap();
        reconcile(&mut conn, "Contacts", &v1(), ReconcilePolicy::Strict).unwrap();
        conn.execute("INSERT INTO Contacts VALUES ('a', 1)", []).unwrap();

        let status = status(&conn, "contacts").unwrap();
        assert!(status.table_exists);
        assert_eq!(status.row_count, 1);
        assert_eq!(status.columns.len(), 2);
    }
}
