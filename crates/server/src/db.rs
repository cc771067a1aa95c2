use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use dayabase_core::config::MetadataConfig;

/// Open the metadata store and apply migrations.
///
/// Foreign keys are enforced on every pooled connection; the registry relies
/// on them to refuse deleting a connection that questions still reference.
pub async fn init_pool(config: &MetadataConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    if let Some(parent) = options.get_filename().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await?;
    info!("Metadata store opened: {}", config.database_url);

    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations applied successfully");
    Ok(())
}

/// Fresh migrated store in a temp dir.
#[cfg(test)]
pub(crate) async fn test_pool() -> (tempfile::TempDir, SqlitePool) {
    let dir = tempfile::tempdir().unwrap();
    let config = MetadataConfig {
        database_url: format!("sqlite://{}", dir.path().join("meta.db").display()),
        max_connections: 2,
    };
    let pool = init_pool(&config).await.unwrap();
    (dir, pool)
}
