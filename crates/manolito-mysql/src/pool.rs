//! sqlx-backed [`QueryRunner`]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use manolito_ir::Row;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Executor, Row as _, TypeInfo, ValueRef};

use crate::{ExecutionError, QueryRunner};

const READ_ONLY_SESSION: &str = "SET SESSION TRANSACTION READ ONLY";

/// Connection parameters for the production database
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,

    /// Mark every pooled session read-only
    pub read_only: bool,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "manolitoGPT".to_string(),
            password: "manolitoGPT".to_string(),
            database: "RDP_DAILY".to_string(),
            read_only: true,
        }
    }
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("read_only", &self.read_only)
            .finish()
    }
}

impl ConnectionSettings {
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

/// Runs queries through a shared MySQL pool
#[derive(Clone)]
pub struct MySqlRunner {
    pool: MySqlPool,
}

impl MySqlRunner {
    /// Build the pool without opening a connection; the first query connects
    pub fn connect_lazy(settings: &ConnectionSettings) -> Self {
        let mut options = MySqlPoolOptions::new();

        if settings.read_only {
            options = options.after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute(READ_ONLY_SESSION).await?;
                    Ok(())
                })
            });
        }

        tracing::info!(
            host = %settings.host,
            port = settings.port,
            database = %settings.database,
            read_only = settings.read_only,
            "MySQL pool configured"
        );

        Self {
            pool: options.connect_lazy_with(settings.connect_options()),
        }
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl QueryRunner for MySqlRunner {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>, ExecutionError> {
        // Prepared statement: the server refuses more than one statement here
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_json).collect()
    }
}

/// Convert a MySQL row to a column-ordered JSON object
fn row_to_json(row: &MySqlRow) -> Result<Row, ExecutionError> {
    let mut out = Row::new();

    for column in row.columns() {
        let name = column.name().to_string();
        let value = cell_to_json(row, column.ordinal(), column.type_info().name()).map_err(
            |e| ExecutionError::Decode {
                column: name.clone(),
                message: e.to_string(),
            },
        )?;
        out.insert(name, value);
    }

    Ok(out)
}

/// How a column's values are turned into JSON, keyed by sqlx's type name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Bool,
    Signed,
    Unsigned,
    Float,
    Double,
    Decimal,
    Date,
    DateTime,
    Time,
    Json,
    /// Binary-flagged strings; `_bin` collations on text columns land here too
    Bytes,
    Opaque,
    Text,
}

fn cell_kind(type_name: &str) -> CellKind {
    match type_name {
        "BOOLEAN" => CellKind::Bool,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => CellKind::Signed,
        t if t.ends_with(" UNSIGNED") => CellKind::Unsigned,
        "FLOAT" => CellKind::Float,
        "DOUBLE" => CellKind::Double,
        "DECIMAL" => CellKind::Decimal,
        "DATE" => CellKind::Date,
        "DATETIME" | "TIMESTAMP" => CellKind::DateTime,
        "TIME" => CellKind::Time,
        "JSON" => CellKind::Json,
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => {
            CellKind::Bytes
        }
        "BIT" | "GEOMETRY" => CellKind::Opaque,
        _ => CellKind::Text,
    }
}

fn cell_to_json(row: &MySqlRow, idx: usize, type_name: &str) -> Result<Value, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(Value::Null);
    }

    let value = match cell_kind(type_name) {
        CellKind::Bool => Value::Bool(row.try_get_unchecked::<bool, _>(idx)?),
        CellKind::Signed => Value::from(row.try_get_unchecked::<i64, _>(idx)?),
        CellKind::Unsigned => Value::from(row.try_get_unchecked::<u64, _>(idx)?),
        CellKind::Float => Value::from(row.try_get_unchecked::<f32, _>(idx)?),
        CellKind::Double => Value::from(row.try_get_unchecked::<f64, _>(idx)?),
        CellKind::Decimal => decimal_to_json(row.try_get_unchecked::<String, _>(idx)?),
        // Zero dates (`0000-00-00`) have no calendar value and fail to decode
        CellKind::Date => match row.try_get_unchecked::<NaiveDate, _>(idx) {
            Ok(date) => Value::String(date.format("%Y-%m-%d").to_string()),
            Err(_) => Value::Null,
        },
        CellKind::DateTime => match row.try_get_unchecked::<NaiveDateTime, _>(idx) {
            Ok(at) => Value::String(at.format("%Y-%m-%d %H:%M:%S").to_string()),
            Err(_) => Value::Null,
        },
        // Durations outside 00:00..24:00 do not fit NaiveTime
        CellKind::Time => match row.try_get_unchecked::<NaiveTime, _>(idx) {
            Ok(time) => Value::String(time.format("%H:%M:%S").to_string()),
            Err(_) => Value::String("<time out of range>".to_string()),
        },
        CellKind::Json => row.try_get_unchecked::<Value, _>(idx)?,
        CellKind::Bytes => bytes_to_json(row.try_get_unchecked::<Vec<u8>, _>(idx)?),
        CellKind::Opaque => {
            let bytes = row.try_get_unchecked::<Vec<u8>, _>(idx)?;
            blob_placeholder(bytes.len())
        }
        CellKind::Text => Value::String(row.try_get_unchecked::<String, _>(idx)?),
    };

    Ok(value)
}

/// UTF-8 content is text that happens to carry the binary flag; anything
/// else is summarized
fn bytes_to_json(bytes: Vec<u8>) -> Value {
    match String::from_utf8(bytes) {
        Ok(text) => Value::String(text),
        Err(err) => blob_placeholder(err.as_bytes().len()),
    }
}

fn blob_placeholder(len: usize) -> Value {
    Value::String(format!("<blob {} bytes>", len))
}

/// Integral decimals (e.g. `SUM(INT)`) become numbers; anything with a
/// fractional part keeps its exact text
fn decimal_to_json(text: String) -> Value {
    match text.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::String(text),
    }
}
