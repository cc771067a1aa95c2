//! OpenAPI documentation aggregator.
//!
//! Collects all `#[utoipa::path]`-annotated handlers and `ToSchema`-derived
//! types into a single OpenAPI spec, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "dayabase API",
        version = "0.1.0",
        description = "Encrypted connection registry and ad-hoc SQL across postgres, mysql, mssql and sqlite.",
    ),
    tags(
        (name = "Health", description = "Server liveness"),
        (name = "Query", description = "Run SQL against a registered connection"),
        (name = "Connections", description = "Connection profile CRUD with encrypted secrets"),
        (name = "Questions", description = "Saved question CRUD"),
        (name = "Dashboards", description = "Dashboard CRUD, question placement and layouts"),
    ),
    paths(
        // Health
        crate::api::health::health,
        // Query
        crate::api::query::query_run,
        // Connections
        crate::api::connections::connections_list,
        crate::api::connections::connections_create,
        crate::api::connections::connections_get,
        crate::api::connections::connections_update,
        crate::api::connections::connections_delete,
        // Questions
        crate::api::questions::questions_list,
        crate::api::questions::questions_create,
        crate::api::questions::questions_get,
        crate::api::questions::questions_update,
        crate::api::questions::questions_delete,
        // Dashboards
        crate::api::dashboards::dashboards_list,
        crate::api::dashboards::dashboards_create,
        crate::api::dashboards::dashboards_get,
        crate::api::dashboards::dashboards_update,
        crate::api::dashboards::dashboards_delete,
        crate::api::dashboards::dashboards_add_question,
        crate::api::dashboards::dashboards_remove_question,
        crate::api::dashboards::dashboards_update_layout,
    ),
    components(schemas(
        crate::api::ErrorResponse,
        crate::api::MessageResponse,
        crate::api::health::HealthResponse,
        crate::api::query::QueryResponse,
        crate::executor::QueryRequest,
        crate::executor::Stage,
        crate::connections::ConnectionSafe,
        crate::connections::ConnectionInput,
        crate::questions::Question,
        crate::questions::QuestionSummary,
        crate::questions::QuestionDetail,
        crate::questions::QuestionInput,
        crate::dashboards::Dashboard,
        crate::dashboards::DashboardDetail,
        crate::dashboards::DashboardQuestion,
        crate::dashboards::DashboardInput,
        crate::dashboards::LinkInput,
    ))
)]
pub struct ApiDoc;
