//! Dashboard CRUD, question placement and bulk layout handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

use crate::dashboards::{Dashboard, DashboardDetail, DashboardInput, LinkInput};
use crate::state::AppState;

use super::{error_response, not_found, store_error, ApiResult, ErrorResponse, MessageResponse};

#[utoipa::path(
    get,
    path = "/api/dashboards",
    tag = "Dashboards",
    responses(
        (status = 200, description = "Dashboards, newest first", body = Vec<Dashboard>),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn dashboards_list(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Dashboard>>> {
    state.dashboards.list().await.map(Json).map_err(store_error)
}

#[utoipa::path(
    post,
    path = "/api/dashboards",
    tag = "Dashboards",
    request_body = DashboardInput,
    responses(
        (status = 201, description = "Dashboard created", body = Dashboard),
        (status = 400, description = "Name missing", body = ErrorResponse)
    )
)]
pub async fn dashboards_create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<DashboardInput>,
) -> ApiResult<(StatusCode, Json<Dashboard>)> {
    let created = state.dashboards.create(&input).await.map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Dashboard with its placed questions and their layout blobs.
#[utoipa::path(
    get,
    path = "/api/dashboards/{id}",
    tag = "Dashboards",
    params(("id" = i64, Path, description = "Dashboard ID")),
    responses(
        (status = 200, description = "Dashboard details", body = DashboardDetail),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn dashboards_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DashboardDetail>> {
    match state.dashboards.get(id).await.map_err(store_error)? {
        Some(d) => Ok(Json(d)),
        None => Err(not_found("Dashboard", id)),
    }
}

#[utoipa::path(
    put,
    path = "/api/dashboards/{id}",
    tag = "Dashboards",
    params(("id" = i64, Path, description = "Dashboard ID")),
    request_body = DashboardInput,
    responses(
        (status = 200, description = "Dashboard updated", body = Dashboard),
        (status = 400, description = "Name missing", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn dashboards_update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(input): Json<DashboardInput>,
) -> ApiResult<Json<Dashboard>> {
    match state.dashboards.update(id, &input).await.map_err(store_error)? {
        Some(d) => Ok(Json(d)),
        None => Err(not_found("Dashboard", id)),
    }
}

#[utoipa::path(
    delete,
    path = "/api/dashboards/{id}",
    tag = "Dashboards",
    params(("id" = i64, Path, description = "Dashboard ID")),
    responses(
        (status = 200, description = "Dashboard deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn dashboards_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if state.dashboards.delete(id).await.map_err(store_error)? {
        Ok(MessageResponse::new("Dashboard deleted successfully."))
    } else {
        Err(not_found("Dashboard", id))
    }
}

/// Place a question on a dashboard with an initial layout.
#[utoipa::path(
    post,
    path = "/api/dashboards/{id}/questions",
    tag = "Dashboards",
    params(("id" = i64, Path, description = "Dashboard ID")),
    request_body = LinkInput,
    responses(
        (status = 201, description = "Question added", body = MessageResponse),
        (status = 400, description = "Missing field, unknown dashboard or question", body = ErrorResponse),
        (status = 409, description = "Question already on dashboard", body = ErrorResponse)
    )
)]
pub async fn dashboards_add_question(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(input): Json<LinkInput>,
) -> ApiResult<(StatusCode, Json<MessageResponse>)> {
    state
        .dashboards
        .add_question(id, &input)
        .await
        .map_err(store_error)?;
    Ok((
        StatusCode::CREATED,
        MessageResponse::new("Question added to dashboard successfully."),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/dashboards/{id}/questions/{question_id}",
    tag = "Dashboards",
    params(
        ("id" = i64, Path, description = "Dashboard ID"),
        ("question_id" = i64, Path, description = "Question ID")
    ),
    responses(
        (status = 200, description = "Question removed", body = MessageResponse),
        (status = 404, description = "Question is not on the dashboard", body = ErrorResponse)
    )
)]
pub async fn dashboards_remove_question(
    State(state): State<Arc<AppState>>,
    Path((id, question_id)): Path<(i64, i64)>,
) -> ApiResult<Json<MessageResponse>> {
    if state
        .dashboards
        .remove_question(id, question_id)
        .await
        .map_err(store_error)?
    {
        Ok(MessageResponse::new("Question removed from dashboard successfully."))
    } else {
        Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Question {} is not on dashboard {}", question_id, id),
        ))
    }
}

/// Replace the layout of every listed grid item in one transaction.
#[utoipa::path(
    put,
    path = "/api/dashboards/{id}/layout",
    tag = "Dashboards",
    params(("id" = i64, Path, description = "Dashboard ID")),
    request_body(content = Vec<serde_json::Value>, description = "Grid items `{i: question_id, ...layout}`"),
    responses(
        (status = 200, description = "Layout saved", body = MessageResponse),
        (status = 400, description = "Body is not an array of grid items", body = ErrorResponse),
        (status = 404, description = "Dashboard or placement not found", body = ErrorResponse)
    )
)]
pub async fn dashboards_update_layout(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .dashboards
        .update_layout(id, &body)
        .await
        .map_err(store_error)?;
    Ok(MessageResponse::new("Dashboard layout updated successfully."))
}
