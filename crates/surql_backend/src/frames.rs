//! SurrealDB statement results to typed data frames.

use crate::error::{BackendError, Result};
use crate::options::EffectiveOptions;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use surql_protocol::{DataFrame, Field, FieldValue, FrameMeta};
use tracing::warn;

/// Column name used for scalar results.
pub const RESULT_COLUMN: &str = "result";
const ID_COLUMN: &str = "id";

/// Convert one statement result into frames named after `name`.
///
/// - `null`, strings and numbers: a one-row frame with a `result` column
/// - arrays: a table over the object entries (other entries are skipped)
/// - objects: one or more frames per key, named `name:key`
pub fn build_frames(
    result: &Value,
    name: &str,
    options: &EffectiveOptions,
    meta: &FrameMeta,
) -> Result<Vec<DataFrame>> {
    let mut frames = Vec::new();
    process(result, name, options, meta, &mut frames)?;
    Ok(frames)
}

fn process(
    result: &Value,
    name: &str,
    options: &EffectiveOptions,
    meta: &FrameMeta,
    frames: &mut Vec<DataFrame>,
) -> Result<()> {
    match result {
        Value::Null | Value::String(_) | Value::Number(_) => {
            let mut row = Map::new();
            row.insert(RESULT_COLUMN.to_string(), result.clone());
            frames.push(table(name, &[&row], options, meta));
            Ok(())
        }
        Value::Array(entries) => {
            let rows: Vec<&Map<String, Value>> =
                entries.iter().filter_map(Value::as_object).collect();
            frames.push(table(name, &rows, options, meta));
            Ok(())
        }
        Value::Object(tables) => {
            for (table_name, table_result) in tables {
                process(
                    table_result,
                    &format!("{}:{}", name, table_name),
                    options,
                    meta,
                    frames,
                )?;
            }
            Ok(())
        }
        Value::Bool(_) => Err(BackendError::UnsupportedResult("bool")),
    }
}

fn table(
    name: &str,
    rows: &[&Map<String, Value>],
    options: &EffectiveOptions,
    meta: &FrameMeta,
) -> DataFrame {
    let keys: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect();

    let mut frame = DataFrame::new(name);
    frame.meta = Some(meta.clone());
    for key in column_order(&keys, options) {
        let cells: Vec<Option<&Value>> = rows.iter().map(|row| row.get(key)).collect();
        let field = if key == options.timestamp_field {
            time_column(key, &cells)
        } else {
            value_column(key, &cells)
        };
        frame.fields.push(field);
    }
    frame
}

/// Timestamp first, then `id`, then the log message (log mode), then the
/// remaining columns in name order.
fn column_order<'a>(keys: &BTreeSet<&'a str>, options: &EffectiveOptions) -> Vec<&'a str> {
    let mut leading: Vec<&str> = vec![options.timestamp_field.as_str(), ID_COLUMN];
    if let Some(message) = options.log_message_field.as_deref() {
        leading.push(message);
    }

    let mut ordered = Vec::with_capacity(keys.len());
    for lead in leading {
        if let Some(key) = keys.get(lead) {
            if !ordered.contains(key) {
                ordered.push(*key);
            }
        }
    }
    for key in keys {
        if !ordered.contains(key) {
            ordered.push(*key);
        }
    }
    ordered
}

fn time_column(name: &str, cells: &[Option<&Value>]) -> Field {
    let values = cells
        .iter()
        .map(|cell| match cell {
            Some(Value::String(text)) => match DateTime::parse_from_rfc3339(text) {
                Ok(t) => FieldValue::Time(t.with_timezone(&Utc)),
                Err(err) => {
                    warn!(column = name, value = %text, error = %err, "unparseable timestamp");
                    FieldValue::Null
                }
            },
            Some(Value::Null) | None => FieldValue::Null,
            Some(other) => {
                warn!(column = name, value = %other, "timestamp is not a string");
                FieldValue::Null
            }
        })
        .collect();
    Field::new(name, values)
}

/// Numeric when every present cell is a number or a string holding one
/// (SurrealDB sends decimals as strings); text otherwise.
fn value_column(name: &str, cells: &[Option<&Value>]) -> Field {
    let numbers: Option<Vec<FieldValue>> = cells.iter().map(|cell| numeric_cell(*cell)).collect();
    if let Some(values) = numbers {
        return Field::new(name, values);
    }

    let values = cells
        .iter()
        .map(|cell| match cell {
            None | Some(Value::Null) => FieldValue::Null,
            Some(Value::String(text)) => FieldValue::Text(text.clone()),
            Some(other) => FieldValue::Text(other.to_string()),
        })
        .collect();
    Field::new(name, values)
}

fn numeric_cell(cell: Option<&Value>) -> Option<FieldValue> {
    match cell {
        None | Some(Value::Null) => Some(FieldValue::Null),
        Some(Value::Number(n)) => n.as_f64().map(FieldValue::Number),
        Some(Value::String(text)) => text.parse::<f64>().ok().map(FieldValue::Number),
        Some(_) => None,
    }
}
