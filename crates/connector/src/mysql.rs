//! MySQL handle over a single `MySqlConnection`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Row as _, TypeInfo, ValueRef};
use tracing::info;

use dayabase_core::EngineKind;

use crate::normalize::{self, ValueKind};
use crate::{ConnectParams, ConnectorError, LiveHandle, Row, Rows};

const ENGINE: EngineKind = EngineKind::Mysql;

pub(crate) struct MySqlHandle {
    conn: Option<MySqlConnection>,
}

impl MySqlHandle {
    pub(crate) async fn connect(params: &ConnectParams) -> Result<Self, ConnectorError> {
        let mut options = MySqlConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.user)
            .password(&params.password);
        if !params.database.is_empty() {
            options = options.database(&params.database);
        }

        let conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(|e| ConnectorError::connect(ENGINE, e))?;
        info!(host = %params.host, port = params.port, database = %params.database, "Connected to MySQL");
        Ok(Self { conn: Some(conn) })
    }
}

#[async_trait]
impl LiveHandle for MySqlHandle {
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

fn normalize_row(row: &MySqlRow) -> Result<Row, sqlx::Error> {
    let mut out = Row::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(idx)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match value_kind(raw.type_info().name()) {
                Some(kind) => {
                    let text: String = row.try_get_unchecked(idx)?;
                    normalize::from_text(kind, &text)
                }
                None => {
                    let bytes: Vec<u8> = row.try_get_unchecked(idx)?;
                    normalize::bytes(&bytes)
                }
            }
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

/// `None` marks binary columns, which are read as raw bytes.
fn value_kind(type_name: &str) -> Option<ValueKind> {
    Some(match type_name {
        "BOOLEAN" => ValueKind::Bool,
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => ValueKind::Integer,
        "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => ValueKind::Integer,
        "FLOAT" | "DOUBLE" => ValueKind::Float,
        "JSON" => ValueKind::Json,
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT" => {
            return None
        }
        _ => ValueKind::Text,
    })
}
