//! HTTP router construction.
//!
//! Assembles all Axum routes, middleware, and OpenAPI docs into a single `Router`.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api;
use crate::state::AppState;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    let api_routes = Router::new()
        .route("/query/run", post(api::query::query_run))
        .route(
            "/connections",
            get(api::connections::connections_list).post(api::connections::connections_create),
        )
        .route(
            "/connections/{id}",
            get(api::connections::connections_get)
                .put(api::connections::connections_update)
                .delete(api::connections::connections_delete),
        )
        .route(
            "/questions",
            get(api::questions::questions_list).post(api::questions::questions_create),
        )
        .route(
            "/questions/{id}",
            get(api::questions::questions_get)
                .put(api::questions::questions_update)
                .delete(api::questions::questions_delete),
        )
        .route(
            "/dashboards",
            get(api::dashboards::dashboards_list).post(api::dashboards::dashboards_create),
        )
        .route(
            "/dashboards/{id}",
            get(api::dashboards::dashboards_get)
                .put(api::dashboards::dashboards_update)
                .delete(api::dashboards::dashboards_delete),
        )
        .route(
            "/dashboards/{id}/questions",
            post(api::dashboards::dashboards_add_question),
        )
        .route(
            "/dashboards/{id}/questions/{question_id}",
            axum::routing::delete(api::dashboards::dashboards_remove_question),
        )
        .route(
            "/dashboards/{id}/layout",
            put(api::dashboards::dashboards_update_layout),
        );

    Router::new()
        .route("/health", get(api::health::health))
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
}

/// `*` means any origin; anything else is a single allowed origin.
pub fn cors_layer(origin: &str) -> CorsLayer {
    if origin.trim() == "*" {
        return CorsLayer::permissive();
    }
    match origin.trim().parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!("Invalid CORS_ORIGIN '{}': {}; allowing any origin", origin, e);
            CorsLayer::permissive()
        }
    }
}
