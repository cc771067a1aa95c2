use std::sync::Arc;

use sqlx::SqlitePool;

use dayabase_connector::Connector;
use dayabase_core::CredentialCipher;

use crate::connections::ConnectionRegistry;
use crate::dashboards::DashboardStore;
use crate::executor::QueryExecutor;
use crate::questions::QuestionStore;

/// Built once at startup and shared by every handler.
pub struct AppState {
    pub pool: SqlitePool,
    pub connections: ConnectionRegistry,
    pub questions: QuestionStore,
    pub dashboards: DashboardStore,
    pub executor: QueryExecutor,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        cipher: Arc<CredentialCipher>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let connections = ConnectionRegistry::new(pool.clone(), cipher.clone());
        let executor = QueryExecutor::new(Arc::new(connections.clone()), cipher, connector);
        Self {
            questions: QuestionStore::new(pool.clone()),
            dashboards: DashboardStore::new(pool.clone()),
            pool,
            connections,
            executor,
        }
    }
}
