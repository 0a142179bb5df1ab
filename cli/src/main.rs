use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use table_controller_core::{DataType, TableConfig};
use table_controller_sqlite::{RowSpan, TableController};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod json;

/// CLI-specific column kind enum with clap argument parsing support.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliDataType {
    Null,
    Integer,
    Real,
    Text,
    Blob,
}

impl From<CliDataType> for DataType {
    fn from(kind: CliDataType) -> Self {
        match kind {
            CliDataType::Null => Self::Null,
            CliDataType::Integer => Self::Integer,
            CliDataType::Real => Self::Real,
            CliDataType::Text => Self::Text,
            CliDataType::Blob => Self::Blob,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "tablectl")]
#[command(about = "Schema-typed access to a single SQLite table")]
struct Cli {
    /// Table configuration file (YAML, or JSON with a .json extension).
    #[arg(long, short = 'c')]
    config: PathBuf,
    /// Log level used when RUST_LOG is not set.
    #[arg(long, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Open or create the table and report what reconciliation did.
    Init,
    /// Append a row given as a JSON object ("-" reads stdin).
    Insert(InsertArgs),
    /// Print the row at a zero-based index.
    Get(GetArgs),
    /// Print the indexes of rows matching a value in columns of one kind.
    Find(FindArgs),
    /// Print a column's values, optionally for a one-based span of rows.
    Column(ColumnArgs),
    /// Print the number of rows.
    Count,
    /// Print every row.
    Dump,
    /// Show table existence, row count, and stored column layout.
    Status,
}

#[derive(Debug, Args)]
struct InsertArgs {
    /// Row as a JSON object keyed by column name.
    #[arg(long)]
    json: String,
}

#[derive(Debug, Args)]
struct GetArgs {
    /// Zero-based row index.
    index: usize,
}

#[derive(Debug, Args)]
struct FindArgs {
    /// Kind of the columns to search.
    #[arg(long = "type", value_enum)]
    kind: CliDataType,
    /// Value to match. Text uses `%` wildcards and ignores case; other
    /// kinds are JSON. Omit for null searches.
    value: Option<String>,
}

#[derive(Debug, Args)]
struct ColumnArgs {
    /// Column name.
    name: String,
    /// One-based position of the first row to read.
    #[arg(long, requires = "count")]
    first: Option<usize>,
    /// Number of rows to read.
    #[arg(long, requires = "first")]
    count: Option<usize>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

/// Initialize the tracing subscriber with the given default log level.
///
/// Logs go to stderr so stdout carries only JSON output.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(cli: Cli) -> Result<(), String> {
    let config = TableConfig::load(&cli.config)
        .map_err(|e| format!("Failed to load config '{}': {e}", cli.config.display()))?;
    debug!(path = %config.path.display(), table = %config.table, "loaded table config");

    let table = TableController::from_config(&config).map_err(|e| {
        format!(
            "Failed to open table '{}' in '{}': {e}",
            config.table,
            config.path.display()
        )
    })?;

    match cli.command {
        Command::Init => run_init(&table),
        Command::Insert(args) => run_insert(&table, args),
        Command::Get(args) => print_json(&table.get_row(args.index).map_err(|e| e.to_string())?),
        Command::Find(args) => run_find(&table, args),
        Command::Column(args) => run_column(&table, args),
        Command::Count => print_json(&table.row_count().map_err(|e| e.to_string())?),
        Command::Dump => print_json(&table.rows().map_err(|e| e.to_string())?),
        Command::Status => print_json(&table.status().map_err(|e| e.to_string())?),
    }
}

// ---------------------------------------------------------------------------
// commands
// ---------------------------------------------------------------------------

fn run_init(table: &TableController) -> Result<(), String> {
    #[derive(Serialize)]
    struct InitReport<'a> {
        table: &'a str,
        #[serde(flatten)]
        outcome: &'a table_controller_sqlite::ReconcileOutcome,
        row_count: usize,
    }

    print_json(&InitReport {
        table: table.table_name(),
        outcome: table.reconcile_outcome(),
        row_count: table.row_count().map_err(|e| e.to_string())?,
    })
}

fn run_insert(table: &TableController, args: InsertArgs) -> Result<(), String> {
    let text = if args.json == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("Failed to read stdin: {e}"))?;
        buf
    } else {
        args.json
    };

    let row = json::row_from_json(table.columns(), &text)?;
    let index = table
        .insert_row(&row)
        .map_err(|e| format!("Insert failed: {e}"))?;
    print_json(&serde_json::json!({ "index": index }))
}

fn run_find(table: &TableController, args: FindArgs) -> Result<(), String> {
    let kind = DataType::from(args.kind);
    let value = json::search_value(kind, args.value.as_deref())?;
    let indexes = table
        .find_row_indexes(&value, kind)
        .map_err(|e| format!("Search failed: {e}"))?;
    print_json(&indexes)
}

fn run_column(table: &TableController, args: ColumnArgs) -> Result<(), String> {
    let values = match (args.first, args.count) {
        (Some(first), Some(count)) => {
            table.column_values_in_range(&args.name, RowSpan::new(first, count))
        }
        _ => table.column_values(&args.name),
    }
    .map_err(|e| e.to_string())?;
    print_json(&values)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let text =
        serde_json::to_string_pretty(value).map_err(|e| format!("Failed to render JSON: {e}"))?;
    println!("{text}");
    Ok(())
}
