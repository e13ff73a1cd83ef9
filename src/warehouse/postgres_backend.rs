//! PostgreSQL warehouse backend
//!
//! `tokio-postgres` is async; the warehouse interface is blocking. Each call
//! drives a private current-thread runtime to completion, which also polls
//! the connection task spawned on that runtime.

use std::error::Error;

use bytes::BytesMut;
use chrono::NaiveDateTime;
use tokio::runtime::Runtime;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tokio_postgres::{Client, NoTls, Row};

use super::{Dialect, LoadError, SqlValue, Warehouse};

/// PostgreSQL database reached over the network
pub struct PostgresWarehouse {
    runtime: Runtime,
    client: Client,
}

impl PostgresWarehouse {
    /// Connect using a libpq-style connection string
    pub fn connect(connection_string: &str) -> Result<Self, LoadError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LoadError::Connection(e.to_string()))?;

        let (client, connection) = runtime
            .block_on(tokio_postgres::connect(connection_string, NoTls))
            .map_err(|e| LoadError::Connection(e.to_string()))?;

        // Spawn connection handler
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "PostgreSQL connection error");
            }
        });

        tracing::debug!("Connected to PostgreSQL warehouse");
        Ok(Self { runtime, client })
    }

    fn bind<'a>(params: &'a [SqlValue]) -> Vec<PgParam<'a>> {
        params.iter().map(PgParam).collect()
    }
}

/// Binds a [`SqlValue`] against whatever type the server inferred
#[derive(Debug)]
struct PgParam<'a>(&'a SqlValue);

impl ToSql for PgParam<'_> {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self.0 {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Text(s) => s.to_sql(ty, out),
            SqlValue::Int(n) => match *ty {
                Type::INT2 => (i16::try_from(*n)?).to_sql(ty, out),
                Type::INT4 => (i32::try_from(*n)?).to_sql(ty, out),
                Type::FLOAT4 => (*n as f32).to_sql(ty, out),
                Type::FLOAT8 => (*n as f64).to_sql(ty, out),
                Type::TEXT | Type::VARCHAR => n.to_string().to_sql(ty, out),
                _ => n.to_sql(ty, out),
            },
            SqlValue::Float(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                _ => f.to_sql(ty, out),
            },
            SqlValue::Timestamp(t) => match *ty {
                Type::TIMESTAMPTZ => t.and_utc().to_sql(ty, out),
                _ => t.to_sql(ty, out),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn read_row(row: &Row) -> Result<Vec<SqlValue>, LoadError> {
    let mut out = Vec::with_capacity(row.len());
    for (i, column) in row.columns().iter().enumerate() {
        let ty = column.type_();
        let value = match *ty {
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => row
                .try_get::<_, Option<String>>(i)?
                .map(SqlValue::Text),
            Type::INT2 => row
                .try_get::<_, Option<i16>>(i)?
                .map(|n| SqlValue::Int(n.into())),
            Type::INT4 => row
                .try_get::<_, Option<i32>>(i)?
                .map(|n| SqlValue::Int(n.into())),
            Type::INT8 => row.try_get::<_, Option<i64>>(i)?.map(SqlValue::Int),
            Type::FLOAT4 => row
                .try_get::<_, Option<f32>>(i)?
                .map(|f| SqlValue::Float(f.into())),
            Type::FLOAT8 => row.try_get::<_, Option<f64>>(i)?.map(SqlValue::Float),
            Type::BOOL => row
                .try_get::<_, Option<bool>>(i)?
                .map(|b| SqlValue::Int(b as i64)),
            Type::TIMESTAMP => row
                .try_get::<_, Option<NaiveDateTime>>(i)?
                .map(SqlValue::Timestamp),
            _ => {
                return Err(LoadError::Conversion(format!(
                    "unsupported column type {} for '{}'",
                    ty,
                    column.name()
                )));
            }
        };
        out.push(value.unwrap_or(SqlValue::Null));
    }
    Ok(out)
}

impl Warehouse for PostgresWarehouse {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<usize, LoadError> {
        let bound = Self::bind(params);
        let refs: Vec<&(dyn ToSql + Sync)> =
            bound.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let affected = self.runtime.block_on(self.client.execute(sql, &refs))?;
        Ok(affected as usize)
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), LoadError> {
        self.runtime.block_on(self.client.batch_execute(sql))?;
        Ok(())
    }

    fn query_row(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<Option<Vec<SqlValue>>, LoadError> {
        let bound = Self::bind(params);
        let refs: Vec<&(dyn ToSql + Sync)> =
            bound.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let rows = self.runtime.block_on(self.client.query(sql, &refs))?;
        rows.first().map(read_row).transpose()
    }

    fn begin(&mut self) -> Result<(), LoadError> {
        self.execute_batch("BEGIN")
    }

    fn commit(&mut self) -> Result<(), LoadError> {
        self.execute_batch("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), LoadError> {
        self.execute_batch("ROLLBACK")
    }
}
