//! Host plugin surface
//!
//! The host query engine dispatches `generate` calls carrying a query
//! context: per-column constraint lists of which only equality is
//! honored. Rows go back as flat string maps. The engine itself (socket,
//! SQL) lives on the host side; these types are the boundary.

pub mod cache;
pub mod exec;

use serde::{Deserialize, Deserializer};

pub use crate::project::Row;
pub use cache::ScoutCacheTable;
pub use exec::ScoutExecTable;

/// Equality, the only operator these tables honor
pub const OP_EQUALS: u8 = 2;

/// Column type as the host declares it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
}

impl ColumnType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDefinition {
    pub name: &'static str,
    pub column_type: ColumnType,
}

const fn text_column(name: &'static str) -> ColumnDefinition {
    ColumnDefinition {
        name,
        column_type: ColumnType::Text,
    }
}

/// Fixed columns of the `scout_exec` table; JSON output adds its own.
pub fn exec_columns() -> Vec<ColumnDefinition> {
    vec![
        text_column("script_name"),
        text_column("args"),
        text_column("console_out"),
        text_column("error_out"),
        text_column("execution_time"),
        text_column("duration"),
        text_column("script_hash"),
        text_column("from_cache"),
        text_column("columns"),
    ]
}

/// Columns of the read-only `scout_cache` table.
pub fn cache_columns() -> Vec<ColumnDefinition> {
    vec![
        text_column("name"),
        text_column("description"),
        text_column("hash"),
        text_column("last_updated"),
        text_column("cache"),
        text_column("path"),
    ]
}

/// One constraint as the host encodes it. The operator arrives as a
/// number or a numeric string depending on the host version.
#[derive(Debug, Clone, Deserialize)]
pub struct Constraint {
    #[serde(deserialize_with = "deserialize_operator")]
    pub op: u8,
    pub expr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnConstraints {
    pub name: String,
    #[serde(default)]
    pub list: Vec<Constraint>,
}

/// The constraint set attached to one `generate` call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryContext {
    #[serde(default)]
    pub constraints: Vec<ColumnConstraints>,
}

impl QueryContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the host's context JSON.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Add an equality constraint (used by the CLI and tests).
    pub fn add_equality(&mut self, column: &str, value: &str) {
        let constraint = Constraint {
            op: OP_EQUALS,
            expr: value.to_string(),
        };
        match self.constraints.iter_mut().find(|c| c.name == column) {
            Some(existing) => existing.list.push(constraint),
            None => self.constraints.push(ColumnConstraints {
                name: column.to_string(),
                list: vec![constraint],
            }),
        }
    }

    /// All equality expressions for `column`, in constraint order.
    pub fn equality(&self, column: &str) -> Vec<String> {
        self.constraints
            .iter()
            .filter(|c| c.name == column)
            .flat_map(|c| c.list.iter())
            .filter(|c| c.op == OP_EQUALS)
            .map(|c| c.expr.clone())
            .collect()
    }
}

/// Interpret a constraint value as a boolean: `"1"` and `"true"`
/// (case-insensitive) are true, everything else is false.
pub fn bool_constraint(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true")
}

fn deserialize_operator<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OpRepr {
        Number(u8),
        Text(String),
    }

    match OpRepr::deserialize(deserializer)? {
        OpRepr::Number(op) => Ok(op),
        OpRepr::Text(raw) => raw.parse().map_err(serde::de::Error::custom),
    }
}
