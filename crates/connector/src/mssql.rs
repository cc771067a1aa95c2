//! SQL Server handle over a tiberius client on a plain tokio socket.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use tiberius::{AuthMethod, Client, ColumnData, Config, FromSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{info, warn};

use dayabase_core::EngineKind;

use crate::normalize;
use crate::{ConnectParams, ConnectorError, LiveHandle, Row, Rows};

const ENGINE: EngineKind = EngineKind::Mssql;

type MssqlClient = Client<Compat<TcpStream>>;

pub(crate) struct MssqlHandle {
    client: Option<MssqlClient>,
}

impl MssqlHandle {
    pub(crate) async fn connect(params: &ConnectParams) -> Result<Self, ConnectorError> {
        let mut config = Config::new();
        config.host(&params.host);
        config.port(params.port);
        config.authentication(AuthMethod::sql_server(&params.user, params.password.as_str()));
        if !params.database.is_empty() {
            config.database(&params.database);
        }
        warn!(host = %params.host, "Trusting SQL Server certificate without verification");
        config.trust_cert();

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| ConnectorError::connect(ENGINE, e))?;
        tcp.set_nodelay(true)
            .map_err(|e| ConnectorError::connect(ENGINE, e))?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| ConnectorError::connect(ENGINE, e))?;
        info!(host = %params.host, port = params.port, database = %params.database, "Connected to SQL Server");
        Ok(Self {
            client: Some(client),
        })
    }
}

#[async_trait]
impl LiveHandle for MssqlHandle {
    fn engine(&self) -> EngineKind {
        ENGINE
    }

    async fn execute(&mut self, sql: &str) -> Result<Rows, ConnectorError> {
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| ConnectorError::closed(ENGINE))?;
        let stream = client
            .simple_query(sql)
            .await
            .map_err(|e| ConnectorError::execute(ENGINE, e))?;
        // Only the first result set is returned for multi-statement batches.
        let rows = stream
            .into_first_result()
            .await
            .map_err(|e| ConnectorError::execute(ENGINE, e))?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let names: Vec<String> =
                    row.columns().iter().map(|c| c.name().to_string()).collect();
                names
                    .into_iter()
                    .zip(row)
                    .map(|(name, data)| (name, column_value(data)))
                    .collect::<Row>()
            })
            .collect())
    }

    async fn close(&mut self) -> Result<(), ConnectorError> {
        match self.client.take() {
            Some(client) => client.close().await.map_err(|e| ConnectorError::close(ENGINE, e)),
            None => Ok(()),
        }
    }
}

fn column_value(data: ColumnData<'static>) -> Value {
    match data {
        ColumnData::U8(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I16(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I32(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::I64(v) => v.map(Value::from).unwrap_or(Value::Null),
        ColumnData::F32(v) => v.map(|f| normalize::float(f as f64)).unwrap_or(Value::Null),
        ColumnData::F64(v) => v.map(normalize::float).unwrap_or(Value::Null),
        ColumnData::Bit(v) => v.map(Value::Bool).unwrap_or(Value::Null),
        ColumnData::String(v) => v.map(|s| Value::String(s.into_owned())).unwrap_or(Value::Null),
        ColumnData::Guid(v) => v.map(|g| Value::String(g.to_string())).unwrap_or(Value::Null),
        ColumnData::Binary(v) => v.map(|b| normalize::bytes(&b)).unwrap_or(Value::Null),
        ColumnData::Numeric(v) => v.map(|n| Value::String(n.to_string())).unwrap_or(Value::Null),
        ColumnData::Xml(v) => v
            .map(|x| Value::String(x.into_owned().into_string()))
            .unwrap_or(Value::Null),
        other => temporal_value(&other),
    }
}

/// Date and time columns come in several wire shapes; chrono decodes them all.
fn temporal_value(data: &ColumnData<'static>) -> Value {
    if let Ok(v) = NaiveDateTime::from_sql(data) {
        return v.map(|d| Value::String(d.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = NaiveDate::from_sql(data) {
        return v.map(|d| Value::String(d.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = NaiveTime::from_sql(data) {
        return v.map(|t| Value::String(t.to_string())).unwrap_or(Value::Null);
    }
    if let Ok(v) = DateTime::<FixedOffset>::from_sql(data) {
        return v.map(|d| Value::String(d.to_rfc3339())).unwrap_or(Value::Null);
    }
    warn!(column_type = column_type_name(data), "Unmapped SQL Server value, returning null");
    Value::Null
}

fn column_type_name(data: &ColumnData<'static>) -> &'static str {
    match data {
        ColumnData::DateTime(_) => "datetime",
        ColumnData::SmallDateTime(_) => "smalldatetime",
        ColumnData::Time(_) => "time",
        ColumnData::Date(_) => "date",
        ColumnData::DateTime2(_) => "datetime2",
        ColumnData::DateTimeOffset(_) => "datetimeoffset",
        _ => "other",
    }
}
