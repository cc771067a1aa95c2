//! Saved question CRUD handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::questions::{Question, QuestionDetail, QuestionInput, QuestionSummary};
use crate::state::AppState;

use super::{not_found, store_error, ApiResult, ErrorResponse, MessageResponse};

#[utoipa::path(
    get,
    path = "/api/questions",
    tag = "Questions",
    responses(
        (status = 200, description = "Question summaries, newest first", body = Vec<QuestionSummary>),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn questions_list(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<QuestionSummary>>> {
    state.questions.list().await.map(Json).map_err(store_error)
}

#[utoipa::path(
    post,
    path = "/api/questions",
    tag = "Questions",
    request_body = QuestionInput,
    responses(
        (status = 201, description = "Question created", body = Question),
        (status = 400, description = "Missing field or unknown connection", body = ErrorResponse)
    )
)]
pub async fn questions_create(
    State(state): State<Arc<AppState>>,
    Json(input): Json<QuestionInput>,
) -> ApiResult<(StatusCode, Json<Question>)> {
    let created = state.questions.create(&input).await.map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Question with the safe fields of its connection.
#[utoipa::path(
    get,
    path = "/api/questions/{id}",
    tag = "Questions",
    params(("id" = i64, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Question details", body = QuestionDetail),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn questions_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<QuestionDetail>> {
    match state.questions.get(id).await.map_err(store_error)? {
        Some(q) => Ok(Json(q)),
        None => Err(not_found("Question", id)),
    }
}

#[utoipa::path(
    put,
    path = "/api/questions/{id}",
    tag = "Questions",
    params(("id" = i64, Path, description = "Question ID")),
    request_body = QuestionInput,
    responses(
        (status = 200, description = "Question updated", body = Question),
        (status = 400, description = "Missing field or unknown connection", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn questions_update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(input): Json<QuestionInput>,
) -> ApiResult<Json<Question>> {
    match state.questions.update(id, &input).await.map_err(store_error)? {
        Some(q) => Ok(Json(q)),
        None => Err(not_found("Question", id)),
    }
}

#[utoipa::path(
    delete,
    path = "/api/questions/{id}",
    tag = "Questions",
    params(("id" = i64, Path, description = "Question ID")),
    responses(
        (status = 200, description = "Question deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = ErrorResponse)
    )
)]
pub async fn questions_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<MessageResponse>> {
    if state.questions.delete(id).await.map_err(store_error)? {
        Ok(MessageResponse::new("Question deleted successfully."))
    } else {
        Err(not_found("Question", id))
    }
}
