//! PostgreSQL handle over a single `PgConnection`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::{Column, Connection, Row as _, TypeInfo, ValueRef};
use tracing::info;

use dayabase_core::EngineKind;

use crate::normalize::{self, ValueKind};
use crate::{ConnectParams, ConnectorError, LiveHandle, Row, Rows};

const ENGINE: EngineKind = EngineKind::Postgres;

pub(crate) struct PostgresHandle {
    conn: Option<PgConnection>,
}

impl PostgresHandle {
    pub(crate) async fn connect(params: &ConnectParams) -> Result<Self, ConnectorError> {
        let mut options = PgConnectOptions::new()
            .host(&params.host)
            .port(params.port)
            .username(&params.user)
            .password(&params.password);
        if !params.database.is_empty() {
            options = options.database(&params.database);
        }

        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| ConnectorError::connect(ENGINE, e))?;
        info!(host = %params.host, port = params.port, database = %params.database, "Connected to PostgreSQL");
        Ok(Self { conn: Some(conn) })
    }
}

#[async_trait]
impl LiveHandle for PostgresHandle {
    fn engine(&self) -> EngineKind {
        ENGINE
    }

    async fn execute(&mut self, sql: &str) -> Result<Rows, ConnectorError> {
        let conn = self.conn.as_mut().ok_or_else(|| ConnectorError::closed(ENGINE))?;
        // Simple query protocol: multi-statement text allowed, values come back as text.
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

fn normalize_row(row: &PgRow) -> Result<Row, sqlx::Error> {
    let mut out = Row::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(idx)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            let kind = value_kind(raw.type_info().name());
            let text: String = row.try_get_unchecked(idx)?;
            match kind {
                // bytea text form is `\x` followed by hex.
                None => Value::String(text.trim_start_matches("\\x").to_string()),
                Some(kind) => normalize::from_text(kind, &text),
            }
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

/// `None` marks bytea.
fn value_kind(type_name: &str) -> Option<ValueKind> {
    Some(match type_name {
        "BOOL" => ValueKind::Bool,
        "INT2" | "INT4" | "INT8" | "OID" => ValueKind::Integer,
        "FLOAT4" | "FLOAT8" => ValueKind::Float,
        "JSON" | "JSONB" => ValueKind::Json,
        "BYTEA" => return None,
        _ => ValueKind::Text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::live_params;
    use serde_json::json;

    #[test]
    fn test_value_kinds() {
        assert_eq!(value_kind("INT4"), Some(ValueKind::Integer));
        assert_eq!(value_kind("BOOL"), Some(ValueKind::Bool));
        assert_eq!(value_kind("JSONB"), Some(ValueKind::Json));
        assert_eq!(value_kind("NUMERIC"), Some(ValueKind::Text));
        assert_eq!(value_kind("TIMESTAMPTZ"), Some(ValueKind::Text));
        assert_eq!(value_kind("BYTEA"), None);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_connect_error() {
        let mut params = crate::test_support::params("postgres", "app");
        params.host = "127.0.0.1".to_string();
        params.port = 1;
        let err = PostgresHandle::connect(&params).await.err().unwrap();
        assert!(matches!(err, ConnectorError::Connect { engine: EngineKind::Postgres, .. }));
    }

    /// Needs `DAYABASE_TEST_PG_{HOST,PORT,USER,PASSWORD,DATABASE}`.
    #[tokio::test]
    #[ignore]
    async fn test_select_one_live() {
        let params = live_params("postgres", "DAYABASE_TEST_PG").expect("postgres env vars");
        let mut handle = PostgresHandle::connect(&params).await.unwrap();
        let rows = handle
            .execute("SELECT 1, 'a'::text AS label, NULL::int AS nothing, true AS flag")
            .await
            .unwrap();
        handle.close().await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["?column?"], json!(1));
        assert_eq!(rows[0]["label"], json!("a"));
        assert_eq!(rows[0]["nothing"], Value::Null);
        assert_eq!(rows[0]["flag"], json!(true));
    }
}
