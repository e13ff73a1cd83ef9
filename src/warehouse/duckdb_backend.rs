//! DuckDB warehouse backend

use std::path::{Path, PathBuf};

use duckdb::types::{TimeUnit, Value};
use duckdb::{Connection, params_from_iter};

use super::{Dialect, LoadError, SqlValue, Warehouse};

/// Embedded DuckDB database
pub struct DuckDbWarehouse {
    conn: Connection,
    path: Option<PathBuf>,
}

impl DuckDbWarehouse {
    /// Open or create a database file at the given path
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let conn = Connection::open(path)
            .map_err(|e| LoadError::Connection(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "Opened DuckDB warehouse");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn memory() -> Result<Self, LoadError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, path: None })
    }

    /// Get the database path (if not in-memory)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Count the rows of a table
    pub fn row_count(&self, table: &str) -> Result<i64, LoadError> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", table.replace('"', "\"\""));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }
}

fn to_duckdb(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Text(s) => Value::Text(s.clone()),
        SqlValue::Int(n) => Value::BigInt(*n),
        SqlValue::Float(f) => Value::Double(*f),
        SqlValue::Timestamp(t) => {
            Value::Timestamp(TimeUnit::Microsecond, t.and_utc().timestamp_micros())
        }
    }
}

fn from_duckdb(value: Value) -> Result<SqlValue, LoadError> {
    let converted = match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(b) => SqlValue::Int(b as i64),
        Value::TinyInt(n) => SqlValue::Int(n.into()),
        Value::SmallInt(n) => SqlValue::Int(n.into()),
        Value::Int(n) => SqlValue::Int(n.into()),
        Value::BigInt(n) => SqlValue::Int(n),
        Value::UTinyInt(n) => SqlValue::Int(n.into()),
        Value::USmallInt(n) => SqlValue::Int(n.into()),
        Value::UInt(n) => SqlValue::Int(n.into()),
        Value::HugeInt(n) => SqlValue::Int(
            i64::try_from(n).map_err(|e| LoadError::Conversion(e.to_string()))?,
        ),
        Value::Float(f) => SqlValue::Float(f.into()),
        Value::Double(f) => SqlValue::Float(f),
        Value::Text(s) => SqlValue::Text(s),
        Value::Timestamp(unit, v) => {
            let micros = match unit {
                TimeUnit::Second => v.saturating_mul(1_000_000),
                TimeUnit::Millisecond => v.saturating_mul(1_000),
                TimeUnit::Microsecond => v,
                TimeUnit::Nanosecond => v / 1_000,
            };
            let ts = chrono::DateTime::from_timestamp_micros(micros).ok_or_else(|| {
                LoadError::Conversion(format!("timestamp {} out of range", micros))
            })?;
            SqlValue::Timestamp(ts.naive_utc())
        }
        other => SqlValue::Text(format!("{:?}", other)),
    };
    Ok(converted)
}

impl Warehouse for DuckDbWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, LoadError> {
        let values: Vec<Value> = params.iter().map(to_duckdb).collect();
        let affected = self.conn.execute(sql, params_from_iter(values))?;
        Ok(affected)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), LoadError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn query_row(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<Vec<SqlValue>>, LoadError> {
        let values: Vec<Value> = params.iter().map(to_duckdb).collect();
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(values))?;

        // Get column count after query execution
        let column_count = rows.as_ref().map(|r| r.column_count()).unwrap_or(0);

        match rows.next()? {
            Some(row) => {
                let mut out = Vec::with_capacity(column_count);
                for i in 0..column_count {
                    let value: Value = row.get(i)?;
                    out.push(from_duckdb(value)?);
                }
                Ok(Some(out))
            }
            None => Ok(None),
        }
    }

    fn begin(&mut self) -> Result<(), LoadError> {
        self.conn.execute_batch("BEGIN TRANSACTION")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), LoadError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), LoadError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }
}
