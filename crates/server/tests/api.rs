//! End-to-end tests driving the full router against a temporary metadata store.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use dayabase_connector::EngineConnector;
use dayabase_core::config::MetadataConfig;
use dayabase_core::CredentialCipher;
use dayabase_server::router::{build_router, cors_layer};
use dayabase_server::{db, AppState};

struct TestApp {
    dir: TempDir,
    router: Router,
}

async fn test_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let config = MetadataConfig {
        database_url: format!("sqlite://{}", dir.path().join("meta.db").display()),
        max_connections: 2,
    };
    let pool = db::init_pool(&config).await.unwrap();
    let cipher = CredentialCipher::new(b"0123456789abcdef0123456789abcdef", b"abcdefghijklmnop")
        .unwrap();
    let state = Arc::new(AppState::new(
        pool,
        Arc::new(cipher),
        Arc::new(EngineConnector),
    ));
    TestApp {
        router: build_router(state, cors_layer("*")),
        dir,
    }
}

impl TestApp {
    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// A sqlite target file with one small table.
    async fn seed_target(&self) -> String {
        let path = self.dir.path().join("target.db");
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = sqlx::SqlitePool::connect(&url).await.unwrap();
        sqlx::raw_sql(
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, score REAL);
             INSERT INTO users VALUES (1, 'ada', 9.5), (2, 'linus', NULL);",
        )
        .execute(&pool)
        .await
        .unwrap();
        pool.close().await;
        path_str(&path)
    }

    async fn create_connection(&self, database_name: &str) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/connections",
                Some(json!({
                    "connection_name": "local",
                    "db_type": "sqlite",
                    "host": "localhost",
                    "port": 0,
                    "db_user": "none",
                    "password": "hunter2",
                    "database_name": database_name,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }

    async fn create_question(&self, connection_id: i64) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/questions",
                Some(json!({
                    "name": "All users",
                    "sql_query": "SELECT * FROM users",
                    "chart_type": "table",
                    "chart_config": {},
                    "connection_id": connection_id,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_i64().unwrap()
    }
}

fn path_str(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_health() {
    let app = test_app().await;
    let (status, body) = app.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["metadata_store"], true);
}

#[tokio::test]
async fn test_connection_crud_never_exposes_secret() {
    let app = test_app().await;
    let id = app.create_connection("/tmp/whatever.db").await;

    let (status, list) = app.send(Method::GET, "/api/connections", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = list.to_string();
    assert!(!text.contains("password"));
    assert!(!text.contains("hunter2"));
    assert_eq!(list[0]["id"], id);

    let (status, one) = app.send(Method::GET, &format!("/api/connections/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(one.get("password_encrypted").is_none());
    assert_eq!(one["db_type"], "sqlite");

    let (status, updated) = app
        .send(
            Method::PUT,
            &format!("/api/connections/{id}"),
            Some(json!({
                "connection_name": "renamed",
                "db_type": "sqlite",
                "host": "localhost",
                "port": 0,
                "db_user": "none",
                "password": "",
                "database_name": "/tmp/whatever.db",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["connection_name"], "renamed");

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/connections/{id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Connection deleted successfully.");

    let (status, body) = app.send(Method::GET, &format!("/api/connections/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("Connection not found: {id}"));
}

#[tokio::test]
async fn test_connection_validation() {
    let app = test_app().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/connections",
            Some(json!({ "connection_name": "half", "db_type": "sqlite" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All connection fields are required.");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/connections",
            Some(json!({
                "connection_name": "x",
                "db_type": "oracle",
                "host": "h",
                "port": 1521,
                "db_user": "u",
                "password": "p",
                "database_name": "d",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Unsupported database type: oracle");
}

#[tokio::test]
async fn test_query_run_returns_rows() {
    let app = test_app().await;
    let target = app.seed_target().await;
    let id = app.create_connection(&target).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/query/run",
            Some(json!({ "sql": "SELECT id, name, score FROM users ORDER BY id", "connectionId": id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["status"], "OK");
    assert_eq!(
        body["rows"],
        json!([
            { "id": 1, "name": "ada", "score": 9.5 },
            { "id": 2, "name": "linus", "score": null },
        ])
    );
}

#[tokio::test]
async fn test_query_run_preserves_column_order() {
    let app = test_app().await;
    let target = app.seed_target().await;
    let id = app.create_connection(&target).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/query/run")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "sql": "SELECT name, id FROM users WHERE id = 1", "connectionId": id })
                .to_string(),
        ))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains(r#"{"name":"ada","id":1}"#), "{text}");
}

#[tokio::test]
async fn test_query_run_client_errors() {
    let app = test_app().await;

    let (status, body) = app
        .send(Method::POST, "/api/query/run", Some(json!({ "sql": "SELECT 1" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "SQL query and connection ID are required.");

    let (status, _) = app
        .send(
            Method::POST,
            "/api/query/run",
            Some(json!({ "sql": "  ", "connectionId": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::POST,
            "/api/query/run",
            Some(json!({ "sql": "SELECT 1", "connectionId": 404 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_query_run_malformed_body_is_bad_request() {
    let app = test_app().await;

    for body in [
        json!({ "sql": "SELECT 1", "connectionId": 1.5 }),
        json!({ "sql": "SELECT 1", "connectionId": true }),
        json!({ "sql": 123, "connectionId": 1 }),
        json!("SELECT 1"),
    ] {
        let (status, reply) = app.send(Method::POST, "/api/query/run", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{reply}");
        assert_eq!(reply["message"], "SQL query and connection ID are required.");
    }

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/query/run")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let reply: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(reply["stage"], "validation");
}

#[tokio::test]
async fn test_query_run_engine_error_reports_stage() {
    let app = test_app().await;
    let target = app.seed_target().await;
    let id = app.create_connection(&target).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/query/run",
            Some(json!({ "sql": "SELECT * FROM missing_table", "connectionId": id })),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "Failed to execute query");
    assert_eq!(body["stage"], "execute");
    assert!(body["error"].as_str().unwrap().contains("no such table"));
}

#[tokio::test]
async fn test_connection_in_use_cannot_be_deleted() {
    let app = test_app().await;
    let target = app.seed_target().await;
    let conn_id = app.create_connection(&target).await;
    let question_id = app.create_question(conn_id).await;

    let (status, body) = app
        .send(Method::DELETE, &format!("/api/connections/{conn_id}"), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Cannot delete this connection because it is still being used by one or more questions."
    );

    let (status, detail) = app
        .send(Method::GET, &format!("/api/questions/{question_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["connection_name"], "local");
    assert!(detail.get("password_encrypted").is_none());

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/questions/{question_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(Method::DELETE, &format!("/api/connections/{conn_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_question_requires_existing_connection() {
    let app = test_app().await;
    let (status, _) = app
        .send(
            Method::POST,
            "/api/questions",
            Some(json!({
                "name": "orphan",
                "sql_query": "SELECT 1",
                "chart_type": "table",
                "chart_config": {},
                "connection_id": 999,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_dashboard_layout_flow() {
    let app = test_app().await;
    let target = app.seed_target().await;
    let conn_id = app.create_connection(&target).await;
    let q1 = app.create_question(conn_id).await;
    let q2 = app.create_question(conn_id).await;

    let (status, dash) = app
        .send(
            Method::POST,
            "/api/dashboards",
            Some(json!({ "name": "Ops", "description": "overview" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let dash_id = dash["id"].as_i64().unwrap();

    for q in [q1, q2] {
        let (status, _) = app
            .send(
                Method::POST,
                &format!("/api/dashboards/{dash_id}/questions"),
                Some(json!({ "question_id": q, "layout_config": { "x": 0, "y": 0, "w": 4, "h": 3 } })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/dashboards/{dash_id}/questions"),
            Some(json!({ "question_id": q1, "layout_config": {} })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/dashboards/{dash_id}/layout"),
            Some(json!([
                { "i": q1.to_string(), "x": 4, "y": 0, "w": 6, "h": 2 },
                { "i": q2, "x": 0, "y": 2, "w": 12, "h": 4 },
            ])),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, detail) = app
        .send(Method::GET, &format!("/api/dashboards/{dash_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["name"], "Ops");
    let questions = detail["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 2);
    let first = questions.iter().find(|q| q["id"] == q1).unwrap();
    assert_eq!(first["layout"], json!({ "x": 4, "y": 0, "w": 6, "h": 2 }));

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/dashboards/{dash_id}/layout"),
            Some(json!({ "i": q1 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/dashboards/{dash_id}/layout"),
            Some(json!([{ "i": 9999, "x": 0 }])),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/dashboards/{dash_id}/questions/{q2}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/api/dashboards/{dash_id}/questions/{q2}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send(Method::DELETE, &format!("/api/dashboards/{dash_id}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .send(Method::GET, &format!("/api/questions/{q1}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_openapi_docs_served() {
    let app = test_app().await;
    let request = Request::builder().uri("/docs").body(Body::empty()).unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
