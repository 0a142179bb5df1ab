//! File-based table configuration.
//!
//! A [`TableConfig`] names the database file, the table, its ordered
//! columns, and how an existing table is reconciled with the declared
//! columns. Files ending in `.json` are read and written as JSON; any
//! other extension is treated as YAML.
//!
//! # Example YAML
//!
//! ```yaml
//! path: contacts.db
//! table: contacts
//! reconcile: strict
//! busy_timeout_ms: 5000
//! columns:
//!   - name: name
//!     type: text
//!   - name: age
//!     type: integer
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ColumnDescriptor;

/// Errors raised while loading or saving a [`TableConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

/// What to do when the table already exists with a different layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// Existing columns must equal the declared ones exactly, in order.
    #[default]
    Strict,
    /// Existing columns must be a matching prefix of the declared ones;
    /// the remaining declared columns are appended.
    AddMissingColumns,
}

/// Declarative description of one table controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Database file, created if absent. Relative paths resolve against
    /// the directory holding the configuration file.
    pub path: PathBuf,
    /// Table name.
    pub table: String,
    /// Ordered column layout.
    pub columns: Vec<ColumnDescriptor>,
    /// Reconciliation policy for an existing table.
    #[serde(default)]
    pub reconcile: ReconcilePolicy,
    /// SQLite busy timeout in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub busy_timeout_ms: Option<u64>,
}

impl TableConfig {
    pub fn new(
        path: impl Into<PathBuf>,
        table: impl Into<String>,
        columns: Vec<ColumnDescriptor>,
    ) -> Self {
        Self {
            path: path.into(),
            table: table.into(),
            columns,
            reconcile: ReconcilePolicy::default(),
            busy_timeout_ms: None,
        }
    }

    /// Loads a configuration file, resolving a relative `path` against
    /// the file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IoError`] if the file cannot be read, or a
    /// JSON/YAML error if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let mut config: Self = if is_json(path) {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };

        if config.path.is_relative() {
            if let Some(dir) = path.parent() {
                config.path = dir.join(&config.path);
            }
        }
        Ok(config)
    }

    /// Saves the configuration as JSON or YAML depending on the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let writer = BufWriter::new(std::fs::File::create(path)?);
        if is_json(path) {
            serde_json::to_writer_pretty(writer, self)?;
        } else {
            serde_yaml::to_writer(writer, self)?;
        }
        Ok(())
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
