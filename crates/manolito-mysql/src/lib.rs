//! MySQL executor for planned queries
//!
//! Runs each accepted [`QuerySpec`] one at a time and folds per-query failures
//! into the result set instead of aborting the batch.

use async_trait::async_trait;
use manolito_ir::{QueryResult, QuerySpec, Row};
use std::time::Instant;
use thiserror::Error;

mod pool;
pub use pool::{ConnectionSettings, MySqlRunner};

#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Message reported by the server or driver, passed through verbatim
    #[error("{0}")]
    Database(String),

    #[error("failed to decode column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl From<sqlx::Error> for ExecutionError {
    fn from(err: sqlx::Error) -> Self {
        match err.as_database_error() {
            Some(db) => ExecutionError::Database(db.message().to_string()),
            None => ExecutionError::Database(err.to_string()),
        }
    }
}

/// Something that can run a single SQL string and hand back its rows
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>, ExecutionError>;
}

/// Execute every query in order, one result per input
///
/// A failing query yields an error sentinel result; the remaining queries
/// still run.
pub async fn execute_all<R>(runner: &R, queries: &[QuerySpec]) -> Vec<QueryResult>
where
    R: QueryRunner + ?Sized,
{
    let mut results = Vec::with_capacity(queries.len());

    for (idx, spec) in queries.iter().enumerate() {
        let started = Instant::now();

        let result = match runner.fetch_rows(&spec.sql).await {
            Ok(rows) => {
                tracing::info!(
                    query = idx + 1,
                    rows = rows.len(),
                    duration_ms = started.elapsed().as_millis() as u64,
                    "Query executed"
                );
                QueryResult::success(spec, rows)
            }
            Err(err) => {
                tracing::warn!(query = idx + 1, sql = %spec.sql, error = %err, "Query failed");
                QueryResult::failure(spec, err.to_string())
            }
        };

        results.push(result);
    }

    results
}
