//! PostgreSQL connection over sqlx.

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{
    postgres::{PgConnectOptions, PgRow},
    Column as _, Connection as _, Row, TypeInfo as _, ValueRef as _,
};
use tokio::runtime::Runtime;

use super::{runtime, Connection, DbUrl, Driver};
use crate::{errors::Result, value::Value};

/// A blocking PostgreSQL connection.
pub struct PostgresConnection {
    // Declared before the runtime so it is dropped while the reactor still exists.
    conn: sqlx::PgConnection,
    runtime: Runtime,
}

impl PostgresConnection {
    pub fn open(url: &DbUrl) -> Result<Self> {
        let mut options = PgConnectOptions::new().database(&url.database);
        if let Some(host) = &url.host {
            options = options.host(host);
        }
        if let Some(port) = url.port {
            options = options.port(port);
        }
        if let Some(user) = &url.user {
            options = options.username(user);
        }
        if let Some(password) = &url.password {
            options = options.password(password);
        }

        let runtime = runtime()?;
        let conn = runtime.block_on(sqlx::PgConnection::connect_with(&options))?;
        Ok(Self { conn, runtime })
    }
}

/// Decodes one row. The simple query protocol returns text, which sqlx
/// decodes according to each column's reported type.
fn decode_row(row: &PgRow) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(row.len());
    for index in 0..row.len() {
        if row.try_get_raw(index)?.is_null() {
            values.push(Value::Null);
            continue;
        }

        let value = match row.column(index).type_info().name() {
            "BOOL" => Value::Boolean(row.try_get::<bool, _>(index)?),
            "INT2" => Value::Integer(i64::from(row.try_get::<i16, _>(index)?)),
            "INT4" => Value::Integer(i64::from(row.try_get::<i32, _>(index)?)),
            "INT8" => Value::Integer(row.try_get::<i64, _>(index)?),
            "FLOAT4" => Value::Real(f64::from(row.try_get::<f32, _>(index)?)),
            "FLOAT8" => Value::Real(row.try_get::<f64, _>(index)?),
            "TIMESTAMP" => Value::Timestamp(row.try_get::<NaiveDateTime, _>(index)?),
            "TIMESTAMPTZ" => Value::Timestamp(row.try_get::<DateTime<Utc>, _>(index)?.naive_utc()),
            _ => Value::Text(row.try_get_unchecked::<String, _>(index)?),
        };
        values.push(value);
    }
    Ok(values)
}

impl Connection for PostgresConnection {
    fn driver(&self) -> Driver {
        Driver::Postgres
    }

    fn execute(&mut self, sql: &str) -> Result<u64> {
        log::debug!("{}", sql);
        let result = self.runtime.block_on(sqlx::raw_sql(sql).execute(&mut self.conn))?;
        Ok(result.rows_affected())
    }

    fn fetch_optional(&mut self, sql: &str) -> Result<Option<Vec<Value>>> {
        log::debug!("{}", sql);
        // raw_sql's own fetch_optional reports an empty result as RowNotFound.
        let rows = self.runtime.block_on(sqlx::raw_sql(sql).fetch_all(&mut self.conn))?;
        rows.first().map(decode_row).transpose()
    }

    fn fetch_all(&mut self, sql: &str) -> Result<Vec<Vec<Value>>> {
        log::debug!("{}", sql);
        let rows = self.runtime.block_on(sqlx::raw_sql(sql).fetch_all(&mut self.conn))?;
        rows.iter().map(decode_row).collect()
    }

    fn close(self: Box<Self>) -> Result<()> {
        let PostgresConnection { conn, runtime } = *self;
        runtime.block_on(conn.close())?;
        Ok(())
    }
}
