//! Narrow command-execution interface to the target database
//!
//! The pipeline never talks to a driver directly. It issues statements
//! through [`Warehouse`], binding every value as a parameter, and manages
//! transaction boundaries with `begin`/`commit`/`rollback`.
//!
//! Backends:
//! - [`DuckDbWarehouse`] (feature `duckdb-backend`, default): embedded columnar store
//! - [`PostgresWarehouse`] (feature `postgres-backend`): PostgreSQL server
//!
//! Statement text is supplied from outside the pipeline: [`StatementCatalog`]
//! for the per-record loader and [`schema`] for DDL.

#[cfg(feature = "duckdb-backend")]
mod duckdb_backend;
mod error;
#[cfg(feature = "postgres-backend")]
mod postgres_backend;
pub mod schema;
mod statements;

#[cfg(feature = "duckdb-backend")]
pub use duckdb_backend::DuckDbWarehouse;
pub use error::LoadError;
#[cfg(feature = "postgres-backend")]
pub use postgres_backend::PostgresWarehouse;
pub use statements::StatementCatalog;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::config::{Backend, ConnectionConfig};

/// SQL dialect spoken by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    DuckDb,
    Postgres,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::DuckDb => write!(f, "duckdb"),
            Dialect::Postgres => write!(f, "postgres"),
        }
    }
}

/// A value bound to, or read back from, a statement parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Float(f) => Some(*f),
            SqlValue::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            SqlValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&String> for SqlValue {
    fn from(value: &String) -> Self {
        SqlValue::Text(value.clone())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value as i64)
    }
}

impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        SqlValue::Int(value as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// Blocking statement executor over one long-lived connection
///
/// The connection is released when the value is dropped, on every exit path.
pub trait Warehouse {
    /// Dialect the statement text must be written in
    fn dialect(&self) -> Dialect;

    /// Execute one parameterised statement, returning the affected row count
    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, LoadError>;

    /// Execute one or more statements without parameters
    fn execute_batch(&mut self, sql: &str) -> Result<(), LoadError>;

    /// Run a query and return its first row, if any
    fn query_row(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<Vec<SqlValue>>, LoadError>;

    fn begin(&mut self) -> Result<(), LoadError>;

    fn commit(&mut self) -> Result<(), LoadError>;

    fn rollback(&mut self) -> Result<(), LoadError>;
}

/// Open the backend named by the connection configuration
pub fn open(config: &ConnectionConfig) -> Result<Box<dyn Warehouse>, LoadError> {
    match config.backend {
        #[cfg(feature = "duckdb-backend")]
        Backend::DuckDb => Ok(Box::new(DuckDbWarehouse::open(&config.path)?)),
        #[cfg(feature = "postgres-backend")]
        Backend::Postgres => Ok(Box::new(PostgresWarehouse::connect(
            &config.postgres_connection_string(),
        )?)),
        #[allow(unreachable_patterns)]
        other => Err(LoadError::UnsupportedBackend(other.to_string())),
    }
}
