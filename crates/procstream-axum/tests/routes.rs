//! Router tests: every route wired to its handler, errors mapped to status codes.

use std::io::Write;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use procstream_axum::bootstrap::{AxumContext, CorsConfig};
use procstream_axum::routes::create_router;
use procstream_core::{ProcessInfo, ProcessStatus, StreamSettings};
use procstream_runtime::testing::StaticProcesses;

fn fleet(dir: &TempDir) -> Vec<ProcessInfo> {
    vec![
        ProcessInfo::new("api", ProcessStatus::Online)
            .with_usage(12.5, 1024)
            .with_log_paths(dir.path().join("api-out.log"), dir.path().join("api-error.log")),
        ProcessInfo::new("worker", ProcessStatus::Online).with_usage(7.5, 2048),
        ProcessInfo::new("cron", ProcessStatus::Stopped),
    ]
}

fn app_with(control: StaticProcesses, cors: &CorsConfig) -> Router {
    let ctx = AxumContext::new(Arc::new(control), StreamSettings::default());
    create_router(ctx, cors)
}

fn app(dir: &TempDir) -> Router {
    app_with(StaticProcesses::new(fleet(dir)), &CorsConfig::AllowAll)
}

async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, Method::GET, uri).await;
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let dir = TempDir::new().unwrap();
    let (status, body) = send(app(&dir), Method::GET, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn processes_endpoint_lists_table() {
    let dir = TempDir::new().unwrap();
    let (status, body) = get_json(app(&dir), "/api/processes").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["api", "worker", "cron"]);
}

#[tokio::test]
async fn unknown_process_is_not_found() {
    let dir = TempDir::new().unwrap();
    let (status, body) = get_json(app(&dir), "/api/processes/ghost").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Process ghost not found");
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn lifecycle_commands_reach_supervisor() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(app.clone(), Method::POST, "/api/processes/cron/start").await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Process cron started");

    let (status, _) = send(app.clone(), Method::POST, "/api/processes/api/restart").await;
    assert_eq!(status, StatusCode::OK);

    let (_, cron) = get_json(app.clone(), "/api/processes/cron").await;
    assert_eq!(cron["status"], "online");
    let (_, api) = get_json(app.clone(), "/api/processes/api").await;
    assert_eq!(api["restarts"], 1);

    let (status, _) = send(app, Method::POST, "/api/processes/ghost/stop").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn metrics_endpoint_aggregates_fleet() {
    let dir = TempDir::new().unwrap();
    let (status, body) = get_json(app(&dir), "/api/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalProcesses"], 3);
    assert_eq!(body["runningProcesses"], 2);
    assert_eq!(body["stoppedProcesses"], 1);
    assert_eq!(body["totalMemory"], 3072);
}

#[tokio::test]
async fn supervisor_outage_is_service_unavailable() {
    let app = app_with(StaticProcesses::unavailable(), &CorsConfig::AllowAll);
    let (status, body) = get_json(app.clone(), "/api/metrics").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], 503);

    let (status, _) = get_json(app, "/api/processes").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn log_search_returns_matches() {
    let dir = TempDir::new().unwrap();
    let mut file = std::fs::File::create(dir.path().join("api-error.log")).unwrap();
    writeln!(file, "boot\nERROR disk full\nok\nERROR retry").unwrap();

    let (status, body) = get_json(
        app(&dir),
        "/api/processes/api/logs/search?pattern=ERROR&stream=error",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processName"], "api");
    assert_eq!(body["pattern"], "ERROR");
    assert_eq!(body["count"], 2);
    assert_eq!(
        body["results"],
        serde_json::json!(["ERROR disk full", "ERROR retry"])
    );
}

#[tokio::test]
async fn log_search_defaults_to_out_stream() {
    let dir = TempDir::new().unwrap();
    let mut file = std::fs::File::create(dir.path().join("api-out.log")).unwrap();
    writeln!(file, "GET /users 200\nGET /health 200").unwrap();

    let (status, body) = get_json(app(&dir), "/api/processes/api/logs/search?pattern=users").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn log_search_error_statuses() {
    let dir = TempDir::new().unwrap();

    // pattern is required
    let (status, _) = get_json(app(&dir), "/api/processes/api/logs/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // log path configured, file absent
    let (status, _) = get_json(app(&dir), "/api/processes/api/logs/search?pattern=x").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // process without log paths
    let (status, body) =
        get_json(app(&dir), "/api/processes/worker/logs/search?pattern=x").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);
}

#[tokio::test]
async fn websocket_route_requires_upgrade() {
    let dir = TempDir::new().unwrap();
    let (status, _) = send(app(&dir), Method::GET, "/api/ws").await;
    assert!(status.is_client_error(), "unexpected status {status}");
}

#[tokio::test]
async fn cors_preflight_echoes_allowed_origin() {
    let dir = TempDir::new().unwrap();
    let app = app_with(
        StaticProcesses::new(fleet(&dir)),
        &CorsConfig::AllowOrigins(vec!["http://dashboard.test".to_string()]),
    );

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/processes")
                .header(header::ORIGIN, "http://dashboard.test")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://dashboard.test"
    );
}
