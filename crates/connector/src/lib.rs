//! Backend connector: opens one live handle per query against a target database.
//!
//! [`EngineConnector`] parses the profile's engine kind and dispatches to one
//! handle type per engine. Every handle implements [`LiveHandle`]: `execute`
//! runs SQL verbatim and returns [`Rows`] in a shape common to all engines;
//! `close` releases the session.

mod error;
mod mssql;
mod mysql;
mod normalize;
mod postgres;
mod sqlite;

use std::fmt;

use async_trait::async_trait;
use indexmap::IndexMap;
use zeroize::Zeroizing;

use dayabase_core::EngineKind;

pub use error::ConnectorError;

/// One result row: column name to JSON value, in column order.
pub type Row = IndexMap<String, serde_json::Value>;

pub type Rows = Vec<Row>;

/// Everything needed to reach a target database, with the secret in plaintext.
/// Built per query and dropped (and zeroized) as soon as the handle is open.
pub struct ConnectParams {
    /// Raw engine kind as stored; parsed by the connector.
    pub engine: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Zeroizing<String>,
    /// Database name, or the file path for sqlite.
    pub database: String,
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("engine", &self.engine)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"********")
            .field("database", &self.database)
            .finish()
    }
}

/// An open session to one target database, owned by a single query.
#[async_trait]
pub trait LiveHandle: Send {
    fn engine(&self) -> EngineKind;

    /// Run `sql` exactly as given. No validation or parameterization.
    async fn execute(&mut self, sql: &str) -> Result<Rows, ConnectorError>;

    /// Release the session. Calling it again is a no-op.
    async fn close(&mut self) -> Result<(), ConnectorError>;
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, params: &ConnectParams) -> Result<Box<dyn LiveHandle>, ConnectorError>;
}

/// The production connector: one handle type per [`EngineKind`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineConnector;

#[async_trait]
impl Connector for EngineConnector {
    async fn connect(&self, params: &ConnectParams) -> Result<Box<dyn LiveHandle>, ConnectorError> {
        let kind: EngineKind = params.engine.parse()?;
        let handle: Box<dyn LiveHandle> = match kind {
            EngineKind::Postgres => Box::new(postgres::PostgresHandle::connect(params).await?),
            EngineKind::Mysql => Box::new(mysql::MySqlHandle::connect(params).await?),
            EngineKind::Mssql => Box::new(mssql::MssqlHandle::connect(params).await?),
            EngineKind::Sqlite => Box::new(sqlite::SqliteHandle::connect(params).await?),
        };
        Ok(handle)
    }
}
