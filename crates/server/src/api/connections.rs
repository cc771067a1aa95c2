//! Connection profile CRUD handlers. Responses never include a secret.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::connections::{ConnectionInput, ConnectionSafe};
use crate::state::AppState;

use super::{not_found, store_error, ApiResult, ErrorResponse, MessageResponse};

/// List all connections, newest first.
#[utoipa::path(
    get,
    path = "/api/connections",
    tag = "Connections",
    responses(
        (status = 200, description = "List of connections", body = Vec<ConnectionSafe>),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn connections_list(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ConnectionSafe>>> {
    state.connections.list().await.map(Json).map_err(store_error)
}

/// Register a connection. The password is encrypted before it is stored.
#[utoipa::path(
    post,
    path = "/api/connections",
    tag = "Connections",
    request_body = ConnectionInput,
    responses(
        (status = 201, description = "Connection created", body = ConnectionSafe),
        (status = 400, description = "Missing field or unsupported engine", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn connections_create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<ConnectionInput>,
) -> ApiResult<(StatusCode, Json<ConnectionSafe>)> {
    let created = state.connections.create(&input).await.map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/connections/{id}",
    tag = "Connections",
    params(("id" = i64, Path, description = "Connection ID")),
    responses(
        (status = 200, description = "Connection details", body = ConnectionSafe),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn connections_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ConnectionSafe>> {
    match state.connections.get_safe(id).await.map_err(store_error)? {
        Some(c) => Ok(Json(c)),
        None => Err(not_found("Connection", id)),
    }
}

/// Update a connection. A blank password keeps the stored secret.
#[utoipa::path(
    put,
    path = "/api/connections/{id}",
    tag = "Connections",
    params(("id" = i64, Path, description = "Connection ID")),
    request_body = ConnectionInput,
    responses(
        (status = 200, description = "Connection updated", body = ConnectionSafe),
        (status = 400, description = "Missing field or unsupported engine", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn connections_update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(input): Json<ConnectionInput>,
) -> ApiResult<Json<ConnectionSafe>> {
    match state.connections.update(id, &input).await.map_err(store_error)? {
        Some(c) => Ok(Json(c)),
        None => Err(not_found("Connection", id)),
    }
}

#[utoipa::path(
    delete,
    path = "/api/connections/{id}",
    tag = "Connections",
    params(("id" = i64, Path, description = "Connection ID")),
    responses(
        (status = 200, description = "Connection deleted", body = MessageResponse),
        (status = 400, description = "Still used by a question", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn connections_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if state.connections.delete(id).await.map_err(store_error)? {
        Ok(MessageResponse::new("Connection deleted successfully."))
    } else {
        Err(not_found("Connection", id))
    }
}
