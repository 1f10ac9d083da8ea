//! SQLite connection over sqlx.

use std::str::FromStr;

use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteRow},
    Connection as _, Row, TypeInfo as _, ValueRef as _,
};
use tokio::runtime::Runtime;

use super::{runtime, Connection, DbUrl, Driver};
use crate::{
    errors::{Error, Result},
    value::Value,
};

/// A blocking SQLite connection.
///
/// Foreign keys are declared but not enforced, the SQLite default.
pub struct SqliteConnection {
    conn: sqlx::SqliteConnection,
    runtime: Runtime,
}

impl SqliteConnection {
    pub fn open(url: &DbUrl) -> Result<Self> {
        let options = if url.is_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new().filename(&url.database).create_if_missing(true)
        };
        let options = options.foreign_keys(false);

        let runtime = runtime()?;
        let conn = runtime.block_on(sqlx::SqliteConnection::connect_with(&options))?;
        Ok(Self { conn, runtime })
    }
}

/// Decodes one row using each value's storage class, since SQLite columns
/// are not bound to a single type.
fn decode_row(row: &SqliteRow) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(row.len());
    for index in 0..row.len() {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            values.push(Value::Null);
            continue;
        }

        let storage = raw.type_info().name().to_string();
        let value = match storage.as_str() {
            "INTEGER" => Value::Integer(row.try_get_unchecked::<i64, _>(index)?),
            "REAL" => Value::Real(row.try_get_unchecked::<f64, _>(index)?),
            "TEXT" => Value::Text(row.try_get_unchecked::<String, _>(index)?),
            other => {
                return Err(Error::Conversion(format!("unsupported SQLite storage class {} in column {}", other, index)));
            }
        };
        values.push(value);
    }
    Ok(values)
}

impl Connection for SqliteConnection {
    fn driver(&self) -> Driver {
        Driver::Sqlite
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
        let SqliteConnection { conn, runtime } = *self;
        runtime.block_on(conn.close())?;
        Ok(())
    }
}
