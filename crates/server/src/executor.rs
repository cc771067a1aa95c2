//! Query executor: resolve a profile, decrypt its secret, connect, run the SQL,
//! and always close the live handle.
//!
//! SQL is executed exactly as received. Callers of `/api/query/run` are trusted
//! to send whatever statements they like against their own registered targets.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use utoipa::ToSchema;

use dayabase_connector::{ConnectParams, Connector, ConnectorError, Rows};
use dayabase_core::{CipherError, CredentialCipher};

use crate::connections::ConnectionProfile;
use crate::error::StoreError;

/// Read side of the registry, as needed by the executor.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn profile(&self, id: i64) -> Result<Option<ConnectionProfile>, StoreError>;
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct QueryRequest {
    #[serde(default, deserialize_with = "lenient_sql")]
    pub sql: Option<String>,
    #[serde(rename = "connectionId", default, deserialize_with = "lenient_id")]
    #[schema(value_type = Option<i64>)]
    pub connection_id: Option<i64>,
}

/// Any non-string `sql` counts as absent.
fn lenient_sql<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

/// Form selects post ids as strings. Anything that is not an integer or an
/// integer string counts as absent.
fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Where a query run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Validation,
    Lookup,
    Decrypt,
    Connect,
    Execute,
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("SQL query and connection ID are required.")]
    Validation,

    #[error("Connection not found: {0}")]
    NotFound(i64),

    #[error("failed to load connection profile: {0}")]
    Lookup(#[source] StoreError),

    #[error("failed to decrypt stored credentials: {0}")]
    Decrypt(#[from] CipherError),

    #[error("{0}")]
    Connect(#[source] ConnectorError),

    #[error("{0}")]
    Execute(#[source] ConnectorError),
}

impl QueryError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Validation => Stage::Validation,
            Self::NotFound(_) | Self::Lookup(_) => Stage::Lookup,
            Self::Decrypt(_) => Stage::Decrypt,
            Self::Connect(_) => Stage::Connect,
            Self::Execute(_) => Stage::Execute,
        }
    }
}

#[derive(Clone)]
pub struct QueryExecutor {
    profiles: Arc<dyn ProfileSource>,
    cipher: Arc<CredentialCipher>,
    connector: Arc<dyn Connector>,
}

impl QueryExecutor {
    pub fn new(
        profiles: Arc<dyn ProfileSource>,
        cipher: Arc<CredentialCipher>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        Self {
            profiles,
            cipher,
            connector,
        }
    }

    pub async fn run(&self, request: &QueryRequest) -> Result<Rows, QueryError> {
        let sql = request
            .sql
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(QueryError::Validation)?;
        let id = request.connection_id.ok_or(QueryError::Validation)?;

        let profile = self
            .profiles
            .profile(id)
            .await
            .map_err(QueryError::Lookup)?
            .ok_or(QueryError::NotFound(id))?;

        let params = self.connect_params(&profile)?;
        let started = Instant::now();
        let mut handle = self
            .connector
            .connect(&params)
            .await
            .map_err(QueryError::Connect)?;
        drop(params);

        let outcome = handle.execute(sql).await.map_err(QueryError::Execute);

        if let Err(e) = handle.close().await {
            warn!(connection_id = id, engine = %handle.engine(), "Failed to close connection: {}", e);
        }

        if let Ok(rows) = &outcome {
            info!(
                connection_id = id,
                engine = %handle.engine(),
                rows = rows.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Query executed"
            );
        }
        outcome
    }

    /// Plaintext lives only inside the returned params, zeroized on drop.
    fn connect_params(&self, profile: &ConnectionProfile) -> Result<ConnectParams, QueryError> {
        let password = self.cipher.decrypt(&profile.password_encrypted)?;
        let port = u16::try_from(profile.port).map_err(|_| {
            QueryError::Connect(ConnectorError::Config(format!(
                "Invalid port: {}",
                profile.port
            )))
        })?;
        Ok(ConnectParams {
            engine: profile.db_type.clone(),
            host: profile.host.clone(),
            port,
            user: profile.db_user.clone(),
            password,
            database: profile.database_name.clone(),
        })
    }
}
