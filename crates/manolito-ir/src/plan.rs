//! Validation of planner output
//!
//! The model is asked for `{"queries": [{"description": ..., "sql": ...}]}`.
//! Anything else is rejected here, at the boundary, before a single query
//! reaches the database.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::guard::check_read_only;
use crate::QuerySpec;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("model response is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("model response has no 'queries' array")]
    SchemaViolation,
}

/// A planned entry dropped by the read-only guard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedQuery {
    pub description: String,
    pub sql: String,
    pub reason: String,
}

/// Validated planner output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub queries: Vec<QuerySpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedQuery>,
}

/// Loosely-typed entry as the model wrote it
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    sql: Option<Value>,
}

impl Plan {
    /// Parse and filter the raw text returned by the model
    ///
    /// Entries that fail the guard are moved to [`Plan::rejected`]; they never
    /// turn into an error.
    pub fn from_model_output(content: &str) -> Result<Self, PlanError> {
        let parsed: Value = serde_json::from_str(content)?;

        let entries = parsed
            .get("queries")
            .and_then(Value::as_array)
            .ok_or(PlanError::SchemaViolation)?;

        let mut plan = Plan::default();

        for entry in entries {
            let raw: RawEntry = match serde_json::from_value(entry.clone()) {
                Ok(raw) => raw,
                Err(_) => {
                    plan.reject(String::new(), String::new(), "entry is not an object");
                    continue;
                }
            };

            let description = text_of(raw.description);
            let sql = text_of(raw.sql);

            match check_read_only(&sql) {
                Ok(()) => plan.queries.push(QuerySpec { description, sql }),
                Err(rejection) => plan.reject(description, sql, rejection.to_string()),
            }
        }

        Ok(plan)
    }

    fn reject(&mut self, description: String, sql: String, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(%description, %sql, %reason, "Dropping planned query");
        self.rejected.push(RejectedQuery {
            description,
            sql,
            reason,
        });
    }
}

/// Strings pass through; anything else (missing, null, numbers) becomes empty
fn text_of(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        _ => String::new(),
    }
}
