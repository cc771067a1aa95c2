//! Dashboards and their question placements.
//!
//! Each placement carries a layout blob owned by the frontend grid. It is
//! stored as JSON text and handed back untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use crate::error::{constraint_error, StoreError};

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Dashboard {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct DashboardQuestion {
    pub id: i64,
    pub name: String,
    pub chart_type: String,
    #[schema(value_type = Object)]
    pub layout: Json<Value>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardDetail {
    #[serde(flatten)]
    pub dashboard: Dashboard,
    pub questions: Vec<DashboardQuestion>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DashboardInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LinkInput {
    pub question_id: Option<i64>,
    #[schema(value_type = Object)]
    pub layout_config: Option<Value>,
}

/// One validated grid item: the question it places and everything else.
#[derive(Debug, PartialEq)]
struct LayoutItem {
    question_id: i64,
    layout: Value,
}

/// Split a grid item `{i, ...rest}` into its question id and `rest`.
/// Grid libraries send `i` as a string; numbers are accepted too.
fn parse_layout_item(item: &Value) -> Result<LayoutItem, StoreError> {
    let invalid = || StoreError::validation("Each layout item must be an object with an 'i' question ID.");
    let mut rest = item.as_object().cloned().ok_or_else(invalid)?;
    let question_id = match rest.remove("i") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(invalid)?;
    Ok(LayoutItem {
        question_id,
        layout: Value::Object(rest),
    })
}

#[derive(Clone)]
pub struct DashboardStore {
    pool: SqlitePool,
}

impl DashboardStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: &DashboardInput) -> Result<Dashboard, StoreError> {
        let name = required_name(input)?;
        let now = Utc::now();
        let dashboard = sqlx::query_as::<_, Dashboard>(
            "INSERT INTO dashboards (name, description, created_at, updated_at)
             VALUES (?, ?, ?, ?)
             RETURNING id, name, description, created_at, updated_at",
        )
        .bind(name)
        .bind(&input.description)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(id = dashboard.id, "Dashboard created");
        Ok(dashboard)
    }

    /// Newest first.
    pub async fn list(&self) -> Result<Vec<Dashboard>, StoreError> {
        let rows = sqlx::query_as::<_, Dashboard>(
            "SELECT id, name, description, created_at, updated_at FROM dashboards ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i64) -> Result<Option<DashboardDetail>, StoreError> {
        let Some(dashboard) = sqlx::query_as::<_, Dashboard>(
            "SELECT id, name, description, created_at, updated_at FROM dashboards WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let questions = sqlx::query_as::<_, DashboardQuestion>(
            "SELECT q.id, q.name, q.chart_type, dq.layout_config AS layout
             FROM dashboard_questions dq
             JOIN questions q ON q.id = dq.question_id
             WHERE dq.dashboard_id = ?
             ORDER BY q.id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(DashboardDetail {
            dashboard,
            questions,
        }))
    }

    pub async fn update(
        &self,
        id: i64,
        input: &DashboardInput,
    ) -> Result<Option<Dashboard>, StoreError> {
        let name = required_name(input)?;
        let dashboard = sqlx::query_as::<_, Dashboard>(
            "UPDATE dashboards SET name = ?, description = ?, updated_at = ?
             WHERE id = ?
             RETURNING id, name, description, created_at, updated_at",
        )
        .bind(name)
        .bind(&input.description)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if dashboard.is_some() {
            info!(id, "Dashboard updated");
        }
        Ok(dashboard)
    }

    /// Placements go with it (ON DELETE CASCADE).
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM dashboards WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(id, "Dashboard deleted");
        }
        Ok(deleted)
    }

    pub async fn add_question(&self, dashboard_id: i64, input: &LinkInput) -> Result<(), StoreError> {
        let (Some(question_id), Some(layout)) = (input.question_id, input.layout_config.as_ref())
        else {
            return Err(StoreError::validation("Question ID and layout config are required."));
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO dashboard_questions (dashboard_id, question_id, layout_config)
             VALUES (?, ?, ?)",
        )
        .bind(dashboard_id)
        .bind(question_id)
        .bind(Json(layout))
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            constraint_error(
                e,
                "Dashboard or question not found.",
                "Question is already on this dashboard.",
            )
        })?;
        touch(&mut tx, dashboard_id).await?;
        tx.commit().await?;

        info!(dashboard_id, question_id, "Question added to dashboard");
        Ok(())
    }

    /// Returns `false` when the question is not on the dashboard.
    pub async fn remove_question(&self, dashboard_id: i64, question_id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "DELETE FROM dashboard_questions WHERE dashboard_id = ? AND question_id = ?",
        )
        .bind(dashboard_id)
        .bind(question_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }
        touch(&mut tx, dashboard_id).await?;
        tx.commit().await?;

        info!(dashboard_id, question_id, "Question removed from dashboard");
        Ok(true)
    }

    /// Store every grid item's layout in one transaction. A malformed item or a
    /// question not placed on the dashboard rolls everything back.
    pub async fn update_layout(&self, dashboard_id: i64, body: &Value) -> Result<(), StoreError> {
        let items = body
            .as_array()
            .ok_or_else(|| StoreError::validation("Layout must be an array of grid items."))?
            .iter()
            .map(parse_layout_item)
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM dashboards WHERE id = ?")
            .bind(dashboard_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::not_found("Dashboard", dashboard_id));
        }

        for item in &items {
            let result = sqlx::query(
                "UPDATE dashboard_questions SET layout_config = ?
                 WHERE dashboard_id = ? AND question_id = ?",
            )
            .bind(Json(&item.layout))
            .bind(dashboard_id)
            .bind(item.question_id)
            .execute(&mut *tx)
            .await?;
            if result.rows_affected() == 0 {
                return Err(StoreError::not_found("Dashboard question", item.question_id));
            }
        }
        touch(&mut tx, dashboard_id).await?;
        tx.commit().await?;

        info!(dashboard_id, items = items.len(), "Dashboard layout updated");
        Ok(())
    }
}

fn required_name(input: &DashboardInput) -> Result<&str, StoreError> {
    input
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| StoreError::validation("Dashboard name is required."))
}

async fn touch(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    dashboard_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE dashboards SET updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(dashboard_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
