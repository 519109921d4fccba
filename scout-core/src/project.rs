//! Row projection
//!
//! Converts a script's captured stdout into the flat rows the host table
//! surface expects. When the first non-empty line parses as a JSON object
//! the script has declared its own schema: each subsequent parseable line
//! becomes one row carrying those keys as columns. Otherwise every
//! non-empty line becomes one plain-text row.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::exec::{ExecStatus, ExecutionResult};

/// A flat table row as handed to the host.
pub type Row = BTreeMap<String, String>;

/// Shape of a script's output, decided by its first non-empty line.
#[derive(Debug)]
enum OutputShape {
    /// One JSON object per line; columns inferred from the first
    Objects { columns: Vec<String> },
    /// One row per plain-text line
    Text,
}

fn infer_shape(first_line: &str) -> OutputShape {
    match serde_json::from_str::<Map<String, Value>>(first_line) {
        Ok(object) => OutputShape::Objects {
            // Deterministic: serde_json object keys iterate in sorted order.
            columns: object.keys().cloned().collect(),
        },
        Err(_) => OutputShape::Text,
    }
}

fn value_to_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

/// Project an execution result into zero or more rows.
pub fn project_rows(result: &ExecutionResult) -> Vec<Row> {
    let from_cache = if result.from_cache { "true" } else { "false" };
    let lines: Vec<&str> = result
        .console_out
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    let Some(first) = lines.first() else {
        // Nothing to project line-by-line. A run that ended in timeout or
        // failure still yields one row so the host sees the terminal
        // status; a completed run with no output yields none.
        if result.status == ExecStatus::Completed {
            return Vec::new();
        }
        return vec![text_row(result, "", from_cache)];
    };

    match infer_shape(first) {
        OutputShape::Objects { columns } => {
            let columns_joined = columns.join(",");
            lines
                .iter()
                .filter_map(|line| serde_json::from_str::<Map<String, Value>>(line).ok())
                .map(|object| {
                    let mut row = Row::new();
                    row.insert("script_name".into(), result.script_name.clone());
                    row.insert("args".into(), result.args.clone());
                    row.insert("from_cache".into(), from_cache.to_string());
                    row.insert("status".into(), result.status.as_str().to_string());
                    row.insert("columns".into(), columns_joined.clone());
                    for (key, value) in object {
                        row.insert(key, value_to_string(value));
                    }
                    row
                })
                .collect()
        }
        OutputShape::Text => lines
            .iter()
            .map(|line| text_row(result, line, from_cache))
            .collect(),
    }
}

fn text_row(result: &ExecutionResult, line: &str, from_cache: &str) -> Row {
    let mut row = Row::new();
    row.insert("script_name".into(), result.script_name.clone());
    row.insert("args".into(), result.args.clone());
    row.insert("console_out".into(), line.to_string());
    row.insert("error_out".into(), result.error_out.clone());
    row.insert("execution_time".into(), result.execution_time.clone());
    row.insert("duration".into(), result.duration.clone());
    row.insert("script_hash".into(), result.script_hash.clone());
    row.insert("from_cache".into(), from_cache.to_string());
    row.insert("status".into(), result.status.as_str().to_string());
    row.insert("columns".into(), "console_out".to_string());
    row
}
