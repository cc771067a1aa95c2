//! Connection registry: named connection profiles in the metadata store.
//!
//! Secrets are encrypted with the process-wide [`CredentialCipher`] before they
//! are written and never leave this module in any form through the public read
//! API. Only [`ProfileSource::profile`], used by the query executor, returns the
//! ciphertext.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use dayabase_core::{CredentialCipher, EngineKind};

use crate::error::StoreError;
use crate::executor::ProfileSource;

const SAFE_COLUMNS: &str =
    "id, connection_name, db_type, host, port, db_user, database_name, created_at";

/// Public view of a profile. Has no secret field at all.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ConnectionSafe {
    pub id: i64,
    pub connection_name: String,
    pub db_type: String,
    pub host: String,
    pub port: i64,
    pub db_user: String,
    pub database_name: String,
    pub created_at: DateTime<Utc>,
}

/// Full stored profile including the hex ciphertext (executor use only).
#[derive(Clone, sqlx::FromRow)]
pub struct ConnectionProfile {
    pub id: i64,
    pub connection_name: String,
    pub db_type: String,
    pub host: String,
    pub port: i64,
    pub db_user: String,
    pub password_encrypted: String,
    pub database_name: String,
}

/// Create/update body. On update a blank or absent `password` keeps the stored secret.
#[derive(Clone, Default, Deserialize, ToSchema)]
pub struct ConnectionInput {
    pub connection_name: Option<String>,
    pub db_type: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub db_user: Option<String>,
    pub password: Option<String>,
    pub database_name: Option<String>,
}

/// Validated non-secret fields shared by create and update.
struct ProfileFields<'a> {
    connection_name: &'a str,
    db_type: EngineKind,
    host: &'a str,
    port: u16,
    db_user: &'a str,
    database_name: &'a str,
}

fn required(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl ConnectionInput {
    /// sqlite profiles only need a name and a file path; the endpoint fields
    /// default to empty.
    fn fields(&self) -> Result<ProfileFields<'_>, StoreError> {
        let missing = || StoreError::validation("All connection fields are required.");
        let db_type: EngineKind = required(&self.db_type)
            .ok_or_else(missing)?
            .parse()
            .map_err(|e: dayabase_core::UnsupportedEngine| StoreError::validation(e.to_string()))?;
        let connection_name = required(&self.connection_name).ok_or_else(missing)?;
        let database_name = required(&self.database_name).ok_or_else(missing)?;

        if !db_type.is_networked() {
            return Ok(ProfileFields {
                connection_name,
                db_type,
                host: required(&self.host).unwrap_or_default(),
                port: self.port.unwrap_or_default(),
                db_user: required(&self.db_user).unwrap_or_default(),
                database_name,
            });
        }

        Ok(ProfileFields {
            connection_name,
            db_type,
            host: required(&self.host).ok_or_else(missing)?,
            port: self.port.ok_or_else(missing)?,
            db_user: required(&self.db_user).ok_or_else(missing)?,
            database_name,
        })
    }

    fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.trim().is_empty())
    }
}

#[derive(Clone)]
pub struct ConnectionRegistry {
    pool: SqlitePool,
    cipher: Arc<CredentialCipher>,
}

impl ConnectionRegistry {
    pub fn new(pool: SqlitePool, cipher: Arc<CredentialCipher>) -> Self {
        Self { pool, cipher }
    }

    pub async fn create(&self, input: &ConnectionInput) -> Result<ConnectionSafe, StoreError> {
        let fields = input.fields()?;
        let password = input
            .new_password()
            .ok_or_else(|| StoreError::validation("All connection fields are required."))?;
        let encrypted = self.cipher.encrypt(password);

        let created = sqlx::query_as::<_, ConnectionSafe>(&format!(
            "INSERT INTO database_connections
                 (connection_name, db_type, host, port, db_user, password_encrypted, database_name, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING {SAFE_COLUMNS}"
        ))
        .bind(fields.connection_name)
        .bind(fields.db_type.as_str())
        .bind(fields.host)
        .bind(fields.port as i64)
        .bind(fields.db_user)
        .bind(&encrypted)
        .bind(fields.database_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(id = created.id, engine = %created.db_type, "Connection created");
        Ok(created)
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<ConnectionSafe>, StoreError> {
        let rows = sqlx::query_as::<_, ConnectionSafe>(&format!(
            "SELECT {SAFE_COLUMNS} FROM database_connections ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_safe(&self, id: i64) -> Result<Option<ConnectionSafe>, StoreError> {
        let row = sqlx::query_as::<_, ConnectionSafe>(&format!(
            "SELECT {SAFE_COLUMNS} FROM database_connections WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Returns `None` when the profile does not exist.
    pub async fn update(
        &self,
        id: i64,
        input: &ConnectionInput,
    ) -> Result<Option<ConnectionSafe>, StoreError> {
        let fields = input.fields()?;
        let encrypted = input.new_password().map(|p| self.cipher.encrypt(p));

        let updated = sqlx::query_as::<_, ConnectionSafe>(&format!(
            "UPDATE database_connections
             SET connection_name = ?, db_type = ?, host = ?, port = ?, db_user = ?,
                 database_name = ?, password_encrypted = COALESCE(?, password_encrypted)
             WHERE id = ?
             RETURNING {SAFE_COLUMNS}"
        ))
        .bind(fields.connection_name)
        .bind(fields.db_type.as_str())
        .bind(fields.host)
        .bind(fields.port as i64)
        .bind(fields.db_user)
        .bind(fields.database_name)
        .bind(encrypted)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if updated.is_some() {
            info!(id, secret_changed = input.new_password().is_some(), "Connection updated");
        }
        Ok(updated)
    }

    /// Returns `false` when the profile does not exist. Refuses with
    /// [`StoreError::ConnectionInUse`] while any question references it.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let in_use: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE connection_id = ?")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if in_use > 0 {
            return Err(StoreError::ConnectionInUse { id });
        }

        let result = sqlx::query("DELETE FROM database_connections WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    StoreError::ConnectionInUse { id }
                }
                _ => StoreError::Database(e),
            })?;
        tx.commit().await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(id, "Connection deleted");
        }
        Ok(deleted)
    }
}

#[async_trait]
impl ProfileSource for ConnectionRegistry {
    async fn profile(&self, id: i64) -> Result<Option<ConnectionProfile>, StoreError> {
        let row = sqlx::query_as::<_, ConnectionProfile>(
            "SELECT id, connection_name, db_type, host, port, db_user, password_encrypted, database_name
             FROM database_connections WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::test_pool;

    pub(crate) fn test_cipher() -> Arc<CredentialCipher> {
        Arc::new(
            CredentialCipher::new(b"0123456789abcdef0123456789abcdef", b"abcdefghijklmnop")
                .unwrap(),
        )
    }

    pub(crate) fn input(name: &str, engine: &str, password: &str) -> ConnectionInput {
        ConnectionInput {
            connection_name: Some(name.to_string()),
            db_type: Some(engine.to_string()),
            host: Some("db.internal".to_string()),
            port: Some(5432),
            db_user: Some("analyst".to_string()),
            password: Some(password.to_string()),
            database_name: Some("warehouse".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_encrypts_secret() {
        let (_dir, pool) = test_pool().await;
        let registry = ConnectionRegistry::new(pool.clone(), test_cipher());

        let created = registry.create(&input("prod", "postgres", "hunter2")).await.unwrap();
        assert_eq!(created.connection_name, "prod");
        assert_eq!(created.db_type, "postgres");

        let stored: String =
            sqlx::query_scalar("SELECT password_encrypted FROM database_connections WHERE id = ?")
                .bind(created.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(stored, "c422bee5de4b26455dedd38147e8dd34");
    }

    #[tokio::test]
    async fn test_safe_views_never_carry_a_secret() {
        let (_dir, pool) = test_pool().await;
        let registry = ConnectionRegistry::new(pool, test_cipher());
        let created = registry.create(&input("prod", "postgres", "hunter2")).await.unwrap();

        let listed = serde_json::to_value(registry.list().await.unwrap()).unwrap();
        let single = serde_json::to_value(registry.get_safe(created.id).await.unwrap()).unwrap();
        for json in [listed.to_string(), single.to_string()] {
            assert!(!json.contains("password"));
            assert!(!json.contains("c422bee5"));
            assert!(!json.contains("hunter2"));
        }
    }

    #[tokio::test]
    async fn test_create_requires_every_field() {
        let (_dir, pool) = test_pool().await;
        let registry = ConnectionRegistry::new(pool, test_cipher());

        let mut missing_host = input("prod", "postgres", "pw");
        missing_host.host = Some("   ".to_string());
        let mut missing_password = input("prod", "postgres", "pw");
        missing_password.password = None;

        for bad in [missing_host, missing_password, ConnectionInput::default()] {
            let err = registry.create(&bad).await.unwrap_err();
            assert_eq!(err.to_string(), "All connection fields are required.");
        }
    }

    #[tokio::test]
    async fn test_sqlite_needs_only_a_path() {
        let (_dir, pool) = test_pool().await;
        let registry = ConnectionRegistry::new(pool, test_cipher());
        let file_only = ConnectionInput {
            connection_name: Some("local".to_string()),
            db_type: Some("sqlite".to_string()),
            password: Some("unused".to_string()),
            database_name: Some("/var/lib/app.db".to_string()),
            ..ConnectionInput::default()
        };
        let created = registry.create(&file_only).await.unwrap();
        assert_eq!(created.host, "");
        assert_eq!(created.port, 0);
        assert_eq!(created.db_user, "");

        let mut no_path = file_only.clone();
        no_path.database_name = None;
        let err = registry.create(&no_path).await.unwrap_err();
        assert_eq!(err.to_string(), "All connection fields are required.");

        let mut networked = file_only;
        networked.db_type = Some("postgres".to_string());
        let err = registry.create(&networked).await.unwrap_err();
        assert_eq!(err.to_string(), "All connection fields are required.");
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_engine() {
        let (_dir, pool) = test_pool().await;
        let registry = ConnectionRegistry::new(pool, test_cipher());
        let err = registry.create(&input("x", "oracle", "pw")).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(err.to_string(), "Unsupported database type: oracle");
    }

    #[tokio::test]
    async fn test_update_keeps_secret_when_password_blank() {
        let (_dir, pool) = test_pool().await;
        let registry = ConnectionRegistry::new(pool, test_cipher());
        let created = registry.create(&input("prod", "postgres", "hunter2")).await.unwrap();
        let before = registry.profile(created.id).await.unwrap().unwrap().password_encrypted;

        let mut rename = input("prod-eu", "postgres", "");
        rename.port = Some(6432);
        let updated = registry.update(created.id, &rename).await.unwrap().unwrap();
        assert_eq!(updated.connection_name, "prod-eu");
        assert_eq!(updated.port, 6432);

        let mut no_password = input("prod-eu", "postgres", "");
        no_password.password = None;
        registry.update(created.id, &no_password).await.unwrap().unwrap();

        let after = registry.profile(created.id).await.unwrap().unwrap().password_encrypted;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_update_reencrypts_new_password() {
        let (_dir, pool) = test_pool().await;
        let cipher = test_cipher();
        let registry = ConnectionRegistry::new(pool, cipher.clone());
        let created = registry.create(&input("prod", "postgres", "hunter2")).await.unwrap();

        registry
            .update(created.id, &input("prod", "postgres", "n3w"))
            .await
            .unwrap()
            .unwrap();
        let profile = registry.profile(created.id).await.unwrap().unwrap();
        assert_eq!(cipher.decrypt(&profile.password_encrypted).unwrap().as_str(), "n3w");
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_profile() {
        let (_dir, pool) = test_pool().await;
        let registry = ConnectionRegistry::new(pool, test_cipher());
        assert!(registry.update(404, &input("x", "mysql", "")).await.unwrap().is_none());
        assert!(!registry.delete(404).await.unwrap());
        assert!(registry.get_safe(404).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_refuses_while_referenced() {
        let (_dir, pool) = test_pool().await;
        let registry = ConnectionRegistry::new(pool.clone(), test_cipher());
        let created = registry.create(&input("prod", "postgres", "pw")).await.unwrap();

        sqlx::query(
            "INSERT INTO questions (name, sql_query, chart_type, chart_config, connection_id, created_at)
             VALUES ('q', 'SELECT 1', 'table', '{}', ?, ?)",
        )
        .bind(created.id)
        .bind(Utc::now())
        .execute(&pool)
        .await
        .unwrap();

        let err = registry.delete(created.id).await.unwrap_err();
        assert!(matches!(err, StoreError::ConnectionInUse { id } if id == created.id));
        assert!(registry.get_safe(created.id).await.unwrap().is_some());

        sqlx::query("DELETE FROM questions").execute(&pool).await.unwrap();
        assert!(registry.delete(created.id).await.unwrap());
        assert!(registry.get_safe(created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let (_dir, pool) = test_pool().await;
        let registry = ConnectionRegistry::new(pool, test_cipher());
        registry.create(&input("first", "mysql", "pw")).await.unwrap();
        registry.create(&input("second", "mssql", "pw")).await.unwrap();

        let names: Vec<String> = registry
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.connection_name)
            .collect();
        assert_eq!(names, ["second", "first"]);
    }
}
