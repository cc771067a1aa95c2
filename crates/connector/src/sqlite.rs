//! SQLite handle. The profile's `database` field is the file path; host, port
//! and credentials are ignored.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column, Connection, Row as _, TypeInfo, ValueRef};
use tracing::info;

use dayabase_core::EngineKind;

use crate::normalize;
use crate::{ConnectParams, ConnectorError, LiveHandle, Row, Rows};

const ENGINE: EngineKind = EngineKind::Sqlite;

pub(crate) struct SqliteHandle {
    conn: Option<SqliteConnection>,
}

impl SqliteHandle {
    pub(crate) async fn connect(params: &ConnectParams) -> Result<Self, ConnectorError> {
        let path = params.database.trim();
        if path.is_empty() {
            return Err(ConnectorError::Config(
                "Database file path is required for SQLite!".to_string(),
            ));
        }

        // A missing file is created, matching the sqlite3 CLI.
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(|e| ConnectorError::connect(ENGINE, e))?;
        info!(path, "Opened SQLite database");
        Ok(Self { conn: Some(conn) })
    }
}

#[async_trait]
impl LiveHandle for SqliteHandle {
    fn engine(&self) -> EngineKind {
        ENGINE
    }

    async fn execute(&mut self, sql: &str) -> Result<Rows, ConnectorError> {
        let conn = self.conn.as_mut().ok_or_else(|| ConnectorError::closed(ENGINE))?;
        let rows = sqlx::Executor::fetch_all(&mut *conn, sqlx::raw_sql(sql))
            .await
            .map_err(|e| ConnectorError::execute(ENGINE, e))?;
        rows.iter()
            .map(normalize_row)
            .collect::<Result<Rows, sqlx::Error>>()
            .map_err(|e| ConnectorError::execute(ENGINE, e))
    }

    async fn close(&mut self) -> Result<(), ConnectorError> {
        match self.conn.take() {
            Some(conn) => conn.close().await.map_err(|e| ConnectorError::close(ENGINE, e)),
            None => Ok(()),
        }
    }
}

/// SQLite is dynamically typed: the storage class of each value decides the
/// JSON type. Integers in a column declared BOOLEAN become booleans.
fn normalize_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let mut out = Row::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(idx)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let declared_bool = column.type_info().name().eq_ignore_ascii_case("BOOLEAN");
            match raw.type_info().name() {
                "INTEGER" => {
                    let i: i64 = row.try_get_unchecked(idx)?;
                    if declared_bool {
                        Value::Bool(i != 0)
                    } else {
                        Value::from(i)
                    }
                }
                "REAL" => normalize::float(row.try_get_unchecked::<f64, _>(idx)?),
                "BLOB" => normalize::bytes(&row.try_get_unchecked::<Vec<u8>, _>(idx)?),
                _ => Value::String(row.try_get_unchecked::<String, _>(idx)?),
            }
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}
