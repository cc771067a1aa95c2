//! Saved questions: a named SQL query bound to one connection profile plus an
//! opaque chart configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{constraint_error, StoreError};

const REQUIRED: &str = "Name, SQL query, chart type, chart config and connection ID are required.";

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Question {
    pub id: i64,
    pub name: String,
    pub sql_query: String,
    pub chart_type: String,
    #[schema(value_type = Object)]
    pub chart_config: Json<Value>,
    pub connection_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct QuestionSummary {
    pub id: i64,
    pub name: String,
    pub chart_type: String,
    pub created_at: DateTime<Utc>,
}

/// A question joined with the safe fields of its connection.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct QuestionDetail {
    pub id: i64,
    pub name: String,
    pub sql_query: String,
    pub chart_type: String,
    #[schema(value_type = Object)]
    pub chart_config: Json<Value>,
    pub connection_id: i64,
    pub created_at: DateTime<Utc>,
    pub connection_name: String,
    pub db_type: String,
    pub host: String,
    pub port: i64,
    pub db_user: String,
    pub database_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct QuestionInput {
    pub name: Option<String>,
    pub sql_query: Option<String>,
    pub chart_type: Option<String>,
    #[schema(value_type = Object)]
    pub chart_config: Option<Value>,
    pub connection_id: Option<i64>,
}

struct QuestionFields<'a> {
    name: &'a str,
    sql_query: &'a str,
    chart_type: &'a str,
    chart_config: &'a Value,
    connection_id: i64,
}

impl QuestionInput {
    fn fields(&self) -> Result<QuestionFields<'_>, StoreError> {
        let (Some(name), Some(sql_query), Some(chart_type), Some(chart_config), Some(connection_id)) = (
            non_blank(&self.name),
            non_blank(&self.sql_query),
            non_blank(&self.chart_type),
            self.chart_config.as_ref(),
            self.connection_id,
        ) else {
            return Err(StoreError::validation(REQUIRED));
        };
        Ok(QuestionFields {
            name,
            sql_query,
            chart_type,
            chart_config,
            connection_id,
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn missing_connection(id: i64) -> String {
    format!("Connection not found: {id}")
}

#[derive(Clone)]
pub struct QuestionStore {
    pool: SqlitePool,
}

impl QuestionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: &QuestionInput) -> Result<Question, StoreError> {
        let f = input.fields()?;
        let question = sqlx::query_as::<_, Question>(
            "INSERT INTO questions (name, sql_query, chart_type, chart_config, connection_id, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING id, name, sql_query, chart_type, chart_config, connection_id, created_at",
        )
        .bind(f.name)
        .bind(f.sql_query)
        .bind(f.chart_type)
        .bind(Json(f.chart_config))
        .bind(f.connection_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| constraint_error(e, &missing_connection(f.connection_id), "Question already exists."))?;

        info!(id = question.id, connection_id = question.connection_id, "Question created");
        Ok(question)
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<QuestionSummary>, StoreError> {
        let rows = sqlx::query_as::<_, QuestionSummary>(
            "SELECT id, name, chart_type, created_at FROM questions ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> Result<Option<QuestionDetail>, StoreError> {
        let row = sqlx::query_as::<_, QuestionDetail>(
            "SELECT q.id, q.name, q.sql_query, q.chart_type, q.chart_config, q.connection_id, q.created_at,
                    c.connection_name, c.db_type, c.host, c.port, c.db_user, c.database_name
             FROM questions q
             JOIN database_connections c ON c.id = q.connection_id
             WHERE q.id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(
        &self,
        id: i64,
        input: &QuestionInput,
    ) -> Result<Option<Question>, StoreError> {
        let f = input.fields()?;
        let question = sqlx::query_as::<_, Question>(
            "UPDATE questions
             SET name = ?, sql_query = ?, chart_type = ?, chart_config = ?, connection_id = ?
             WHERE id = ?
             RETURNING id, name, sql_query, chart_type, chart_config, connection_id, created_at",
        )
        .bind(f.name)
        .bind(f.sql_query)
        .bind(f.chart_type)
        .bind(Json(f.chart_config))
        .bind(f.connection_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| constraint_error(e, &missing_connection(f.connection_id), "Question already exists."))?;

        if question.is_some() {
            info!(id, "Question updated");
        }
        Ok(question)
    }

    /// Removes the question and, by cascade, its dashboard placements.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM questions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(id, "Question deleted");
        }
        Ok(deleted)
    }
}
