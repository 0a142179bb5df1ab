//! SQL generation and table introspection.
//!
//! Builds the `CREATE TABLE` / `ALTER TABLE` statements for a declared
//! column list and reads the stored layout back out of SQLite. Every
//! identifier is validated by the caller and double-quoted here.
//!
//! # Table structure
//!
//! A controlled table holds exactly the declared columns, each with the
//! declared SQL type of its [`DataType`]. Row order comes from SQLite's
//! implicit `rowid`; no primary key or index is added.

use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use table_controller_core::{ColumnDescriptor, DataType, validate_columns, validate_identifier};

use crate::error::Result;

/// A column as SQLite reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredColumn {
    /// Column name.
    pub name: String,
    /// Declared SQL type, verbatim.
    pub declared_type: String,
}

impl StoredColumn {
    /// Kind of the declared type, if it is one this crate writes.
    pub fn data_type(&self) -> Option<DataType> {
        DataType::from_sql_type(&self.declared_type)
    }

    /// Returns `true` if this stored column is the given declared column.
    ///
    /// Names compare case-insensitively, as SQLite resolves them.
    pub fn matches(&self, column: &ColumnDescriptor) -> bool {
        self.name.eq_ignore_ascii_case(column.name())
            && self.data_type() == Some(column.data_type())
    }
}

/// Quotes an identifier for interpolation into SQL.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Generates the `CREATE TABLE IF NOT EXISTS` statement for a table.
///
/// # Errors
///
/// Returns a validation error if the table name or any column is invalid.
pub fn generate_create_table_sql(table: &str, columns: &[ColumnDescriptor]) -> Result<String> {
    validate_identifier(table)?;
    validate_columns(columns)?;

    let defs: Vec<String> = columns.iter().map(column_definition).collect();
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        quote_identifier(table),
        defs.join(", ")
    ))
}

/// Generates the `ALTER TABLE … ADD COLUMN` statement for one column.
pub fn generate_add_column_sql(table: &str, column: &ColumnDescriptor) -> Result<String> {
    validate_identifier(table)?;
    validate_identifier(column.name())?;
    Ok(format!(
        "ALTER TABLE {} ADD COLUMN {};",
        quote_identifier(table),
        column_definition(column)
    ))
}

fn column_definition(column: &ColumnDescriptor) -> String {
    format!(
        "{} {}",
        quote_identifier(column.name()),
        column.data_type().sql_type()
    )
}

/// Checks whether a table with the given name exists.
///
/// Names are matched case-insensitively, as SQLite resolves them.
pub(crate) fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let mut stmt = conn.prepare(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
    )?;
    let count: i64 = stmt.query_row(params![table], |row| row.get(0))?;
    Ok(count > 0)
}

/// Describes the schema object stored under `name`: `"table"`, `"view"`,
/// or `"virtual table"`. Returns `None` if nothing by that name exists.
pub(crate) fn stored_object_kind(conn: &Connection, name: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare(
        "SELECT type, sql FROM sqlite_master \
         WHERE type IN ('table', 'view') AND name = ?1 COLLATE NOCASE",
    )?;
    let found = stmt
        .query_row(params![name], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?))
        })
        .optional()?;

    Ok(found.map(|(kind, sql)| {
        let is_virtual = sql
            .as_deref()
            .is_some_and(|sql| sql.trim_start().to_ascii_uppercase().starts_with("CREATE VIRTUAL"));
        if kind == "table" && is_virtual {
            "virtual table".to_string()
        } else {
            kind
        }
    }))
}

/// Reads the stored column layout of a table, in column order.
///
/// Returns an empty vector if the table does not exist.
pub(crate) fn stored_columns(conn: &Connection, table: &str) -> Result<Vec<StoredColumn>> {
    let mut stmt =
        conn.prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
    let columns = stmt
        .query_map(params![table], |row| {
            Ok(StoredColumn {
                name: row.get(0)?,
                declared_type: row.get(1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::text("name"),
            ColumnDescriptor::integer("age"),
            ColumnDescriptor::real("score"),
            ColumnDescriptor::blob("avatar"),
            ColumnDescriptor::null("spare"),
        ]
    }

    #[test]
    fn test_create_table_sql() {
        let sql = generate_create_table_sql("contacts", &columns()).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"contacts\" (\"name\" TEXT, \"age\" INTEGER, \
             \"score\" REAL, \"avatar\" BLOB, \"spare\" NONE);"
        );
    }

    #[test]
    fn test_create_table_sql_rejects_bad_input() {
        assert!(generate_create_table_sql("drop;--", &columns()).is_err());
        assert!(generate_create_table_sql("contacts", &[]).is_err());
    }

    #[test]
    fn test_add_column_sql() {
        let sql = generate_add_column_sql("contacts", &ColumnDescriptor::text("email")).unwrap();
        assert_eq!(sql, "ALTER TABLE \"contacts\" ADD COLUMN \"email\" TEXT;");
    }

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_stored_columns_round_trip() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!table_exists(&conn, "contacts").unwrap());
        assert!(stored_columns(&conn, "contacts").unwrap().is_empty());

        conn.execute_batch(&generate_create_table_sql("contacts", &columns()).unwrap())
            .unwrap();
        assert!(table_exists(&conn, "contacts").unwrap());

        let stored = stored_columns(&conn, "contacts").unwrap();
        assert_eq!(stored.len(), 5);
        for (stored, declared) in stored.iter().zip(columns().iter()) {
            assert!(stored.matches(declared), "{stored:?} vs {declared:?}");
        }
    }

    #[test]
    fn test_table_lookup_ignores_case() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&generate_create_table_sql("Contacts", &columns()).unwrap())
            .unwrap();
        assert!(table_exists(&conn, "contacts").unwrap());
        assert_eq!(
            stored_object_kind(&conn, "CONTACTS").unwrap().as_deref(),
            Some("table")
        );
    }

    #[test]
    fn test_stored_object_kind_reports_views() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(stored_object_kind(&conn, "names").unwrap(), None);

        conn.execute_batch(
            "CREATE TABLE base (name TEXT); CREATE VIEW names AS SELECT name FROM base;",
        )
        .unwrap();
        assert_eq!(
            stored_object_kind(&conn, "names").unwrap().as_deref(),
            Some("view")
        );
        assert!(!table_exists(&conn, "names").unwrap());
    }
}
