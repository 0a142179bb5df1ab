//! JSON input coercion for the command line.
//!
//! JSON cannot tell an integer-valued real from an integer, so values are
//! read against the declared kind of the column they target.

use serde_json::Value as JsonValue;
use table_controller_core::{ColumnDescriptor, DataType, Row, Value};

/// Converts one JSON value into a [`Value`] of the given kind.
///
/// JSON `null` always becomes [`Value::Null`]; row validation decides
/// whether the column accepts it.
pub fn value_from_json(json: &JsonValue, kind: DataType) -> Result<Value, String> {
    match (kind, json) {
        (_, JsonValue::Null) => Ok(Value::Null),
        (DataType::Integer, JsonValue::Number(n)) => n
            .as_i64()
            .map(Value::Integer)
            .ok_or_else(|| format!("expected a 64-bit integer, got {n}")),
        (DataType::Real, JsonValue::Number(n)) => n
            .as_f64()
            .map(Value::Real)
            .ok_or_else(|| format!("expected a number, got {n}")),
        (DataType::Text, JsonValue::String(s)) => Ok(Value::Text(s.clone())),
        (DataType::Blob, JsonValue::Array(_)) => serde_json::from_value::<Vec<u8>>(json.clone())
            .map(Value::Blob)
            .map_err(|e| format!("expected an array of bytes: {e}")),
        (kind, other) => Err(format!("expected {kind}, got {other}")),
    }
}

/// Parses a JSON object into a [`Row`], coercing each declared column's
/// value to its kind. Undeclared keys are kept (as null when their value
/// has no cell equivalent) so validation can report them.
pub fn row_from_json(columns: &[ColumnDescriptor], text: &str) -> Result<Row, String> {
    let object: serde_json::Map<String, JsonValue> =
        serde_json::from_str(text).map_err(|e| format!("row must be a JSON object: {e}"))?;

    let mut row = Row::new();
    for (key, json) in object {
        let value = match columns.iter().find(|c| c.name() == key) {
            Some(column) => value_from_json(&json, column.data_type())
                .map_err(|e| format!("column '{key}': {e}"))?,
            None => serde_json::from_value::<Value>(json).unwrap_or(Value::Null),
        };
        row.insert(key, value);
    }
    Ok(row)
}

/// Builds a search value from a command-line argument.
///
/// Text is taken verbatim (so `%jon%` needs no quoting); other kinds are
/// parsed as JSON. Null searches take no argument.
pub fn search_value(kind: DataType, raw: Option<&str>) -> Result<Value, String> {
    if kind == DataType::Null {
        return Ok(Value::Null);
    }
    let raw = raw.ok_or_else(|| format!("a {kind} search needs a value"))?;
    if kind == DataType::Text {
        return Ok(Value::Text(raw.to_string()));
    }
    let json: JsonValue =
        serde_json::from_str(raw).map_err(|e| format!("invalid {kind} value '{raw}': {e}"))?;
    value_from_json(&json, kind)
}
