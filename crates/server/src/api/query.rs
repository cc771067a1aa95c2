//! Ad-hoc SQL execution against a registered connection.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use dayabase_connector::Rows;

use crate::executor::{QueryError, QueryRequest, Stage};
use crate::state::AppState;

use super::{error_response, ApiError, ApiResult, ErrorResponse};

#[derive(Debug, Serialize, ToSchema)]
pub struct QueryResponse {
    pub status: &'static str,
    #[schema(value_type = Vec<Object>)]
    pub rows: Rows,
}

/// Run SQL verbatim against the referenced connection and return normalized rows.
#[utoipa::path(
    post,
    path = "/api/query/run",
    tag = "Query",
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Rows as ordered column-to-value objects", body = QueryResponse),
        (status = 400, description = "sql or connectionId missing or malformed", body = ErrorResponse),
        (status = 404, description = "Unknown connectionId", body = ErrorResponse),
        (status = 500, description = "Failed stage and engine error text", body = ErrorResponse)
    )
)]
pub async fn query_run(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<Json<QueryResponse>> {
    let Json(req) = payload.map_err(rejected_body)?;
    let rows = state.executor.run(&req).await.map_err(query_error)?;
    Ok(Json(QueryResponse { status: "OK", rows }))
}

/// A body that is not a JSON object is treated like one with no fields.
fn rejected_body(rejection: JsonRejection) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            message: QueryError::Validation.to_string(),
            error: Some(rejection.body_text()),
            stage: Some(Stage::Validation),
        }),
    )
}

fn query_error(e: QueryError) -> ApiError {
    match e {
        QueryError::Validation => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        QueryError::NotFound(_) => error_response(StatusCode::NOT_FOUND, e.to_string()),
        _ => {
            let stage = e.stage();
            error!(?stage, "Query failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    message: "Failed to execute query".into(),
                    error: Some(e.to_string()),
                    stage: Some(stage),
                }),
            )
        }
    }
}
