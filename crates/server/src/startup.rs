//! Server startup: key material validation, shared state, and the listener.

use std::sync::Arc;

use tracing::info;

use dayabase_connector::{Connector, EngineConnector};
use dayabase_core::{Config, CredentialCipher};

use crate::router::{build_router, cors_layer};
use crate::state::AppState;
use crate::db;

/// Validate `ENCRYPTION_KEY`/`IV`. Any failure here must stop the process.
pub fn load_cipher(config: &Config) -> anyhow::Result<Arc<CredentialCipher>> {
    let cipher = CredentialCipher::from_config(&config.cipher)?;
    info!("Credential cipher ready (AES-256-CBC)");
    Ok(Arc::new(cipher))
}

pub async fn build_app_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let cipher = load_cipher(config)?;
    let pool = db::init_pool(&config.metadata).await?;
    let connector: Arc<dyn Connector> = Arc::new(EngineConnector);
    Ok(Arc::new(AppState::new(pool, cipher, connector)))
}

pub async fn serve(config: &Config) -> anyhow::Result<()> {
    config.log_summary();
    let state = build_app_state(config).await?;
    let app = build_router(state, cors_layer(&config.server.cors_origin));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    info!("API docs at http://{}/docs", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
