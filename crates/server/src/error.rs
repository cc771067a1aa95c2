use thiserror::Error;

/// Failures from the metadata-store modules (connections, questions, dashboards).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error(
        "Cannot delete this connection because it is still being used by one or more questions."
    )]
    ConnectionInUse { id: i64 },

    /// A row references something that does not exist (foreign-key violation).
    #[error("{0}")]
    InvalidReference(String),

    #[error("{0}")]
    Conflict(String),
}

impl StoreError {
    pub(crate) fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// Map constraint violations on insert/update to their named variants.
pub(crate) fn constraint_error(err: sqlx::Error, missing: &str, duplicate: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            StoreError::InvalidReference(missing.to_string())
        }
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(duplicate.to_string())
        }
        _ => StoreError::Database(err),
    }
}
