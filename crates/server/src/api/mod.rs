//! HTTP handlers, one module per resource.
//!
//! Shared response types and the error mapping live here in mod.rs.

pub mod connections;
pub mod dashboards;
pub mod doc;
pub mod health;
pub mod query;
pub mod questions;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::error::StoreError;
use crate::executor::Stage;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) type ApiResult<T> = Result<T, ApiError>;

// ── Helpers ─────────────────────────────────────────────────────

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            message: message.into(),
            error: None,
            stage: None,
        }),
    )
}

pub(crate) fn internal_error(e: impl std::fmt::Display) -> ApiError {
    error!("Request failed: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            message: "Internal server error".into(),
            error: Some(e.to_string()),
            stage: None,
        }),
    )
}

pub(crate) fn not_found(resource: &str, id: i64) -> ApiError {
    error_response(StatusCode::NOT_FOUND, format!("{} not found: {}", resource, id))
}

pub(crate) fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::Validation(_)
        | StoreError::ConnectionInUse { .. }
        | StoreError::InvalidReference(_) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        StoreError::NotFound { .. } => error_response(StatusCode::NOT_FOUND, e.to_string()),
        StoreError::Conflict(_) => error_response(StatusCode::CONFLICT, e.to_string()),
        StoreError::Database(_) => internal_error(e),
    }
}
