//! Manolito query representation
//!
//! Shared data model for one question/answer cycle: the queries the planner
//! proposes, the results the executor collects, and the validation that turns
//! raw model output into a [`Plan`].

use serde::{Deserialize, Serialize};

pub mod guard;
mod plan;

pub use guard::{check_read_only, Rejection};
pub use plan::{Plan, PlanError, RejectedQuery};

/// One result row: column name → scalar value, in column order
pub type Row = serde_json::Map<String, serde_json::Value>;

/// Prefix placed on the description of a query that failed to execute
pub const ERROR_MARKER: &str = "ERROR ejecutando: ";

/// A planned, not-yet-executed SQL statement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub description: String,
    pub sql: String,
}

impl QuerySpec {
    pub fn new(description: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            sql: sql.into(),
        }
    }
}

/// Outcome of executing a [`QuerySpec`]
///
/// Failures are carried as data: `rows` holds a single `{ "error": ... }` row
/// and the description is prefixed with [`ERROR_MARKER`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub description: String,
    pub sql: String,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn success(spec: &QuerySpec, rows: Vec<Row>) -> Self {
        Self {
            description: spec.description.clone(),
            sql: spec.sql.clone(),
            rows,
        }
    }

    pub fn failure(spec: &QuerySpec, message: impl Into<String>) -> Self {
        let mut row = Row::new();
        row.insert(
            "error".to_string(),
            serde_json::Value::String(message.into()),
        );

        Self {
            description: format!("{}{}", ERROR_MARKER, spec.description),
            sql: spec.sql.clone(),
            rows: vec![row],
        }
    }

    pub fn is_error(&self) -> bool {
        self.description.starts_with(ERROR_MARKER)
            && self.rows.len() == 1
            && self.rows[0].contains_key("error")
    }
}
