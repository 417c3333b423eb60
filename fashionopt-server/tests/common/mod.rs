//! Shared helpers for server tests: a router wired to shell-script optimizers
//! and request builders.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use fashionopt_core::domain::simulation::SimulationStatus;
use fashionopt_server::api::create_router;
use fashionopt_server::config::{OptimizerCommand, ServerConfig};
use fashionopt_server::state::AppState;

pub const BOUNDARY: &str = "fashionopt-test-boundary";

pub const GA_OK: &str = r#"echo "[PROGRESS] GA: 50.0% completed, estimated 1.0s remaining"
echo '{"total_profit": 1000.0, "products": [{"name": "Dress", "quantity": 10, "price": 50.0, "unit_cost": 20.0, "profit_per_unit": 30.0, "total_profit": 300.0, "total_cost": 200.0}]}'
"#;

pub const ACO_OK: &str = r#"[ -f "$1" ] || exit 3
echo "[PROGRESS] ACO: 25.0% completed, estimated 2.0s remaining"
echo '{"total_profit": 800.0, "products": [{"name": "Skirt", "quantity": 4, "price": 40.0, "unit_cost": 15.0, "profit_per_unit": 25.0, "total_profit": 100.0, "total_cost": 60.0}]}'
"#;

pub const CRASH: &str = "echo 'Traceback (most recent call last):' >&2\nexit 1\n";

pub const NO_SPACE: &str = r#"echo '{"error": "not enough shelves", "error_kind": "shelf_space", "required_shelf_space": 500, "available_shelf_space": 300}'
"#;

pub struct TestServer {
    pub app: Router,
    pub state: AppState,
    pub dir: TempDir,
}

fn write_script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

/// A server whose optimizers are the given shell scripts
pub fn server(ga_script: &str, aco_script: &str) -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let ga = write_script(dir.path(), "ga.sh", ga_script);
    let aco = write_script(dir.path(), "aco.sh", aco_script);

    let config = ServerConfig {
        upload_dir: dir.path().join("uploads"),
        ga: OptimizerCommand::new("sh", ga),
        aco: OptimizerCommand::new("sh", aco),
        ..ServerConfig::default()
    };

    let state = AppState::new(&config);
    TestServer {
        app: create_router(state.clone()),
        state,
        dir,
    }
}

pub fn valid_fields() -> Vec<(&'static str, &'static str)> {
    vec![
        ("productionBudget", "5000"),
        ("marketingBudget", "1000"),
        ("logisticsBudget", "800"),
        ("discountBase", "10"),
        ("shelfSpace", "300"),
        ("chromosomeBits", "8"),
        ("colName", "Name"),
        ("colPrice", "Price"),
        ("colCp", "Cp"),
        ("colCm", "Cm"),
        ("colCl", "Cl"),
        ("colShelfCost", "Cs"),
        ("colAge", "Age"),
        ("colStock", "Stock"),
        ("colShelf", "Shelf"),
        ("colDemand", "Demand"),
    ]
}

/// Builds a multipart/form-data submission
pub fn submit_request(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();

    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }

    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/api/simulate")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn post(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn submit_valid(app: &Router) -> String {
    let (status, body) = send(
        app,
        submit_request(&valid_fields(), Some(("products.xlsx", b"Name,Price\nDress,50".as_slice()))),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "submission failed: {body}");
    body
}

pub async fn status_of(app: &Router, id: &str) -> SimulationStatus {
    let (status, body) = get(app, &format!("/api/simulate/status/{id}")).await;
    assert_eq!(status, StatusCode::OK, "status request failed: {body}");
    SimulationStatus::from_json(&body).unwrap()
}

/// Polls until both optimizers are done
pub async fn wait_until_finished(app: &Router, id: &str) -> SimulationStatus {
    for _ in 0..200 {
        let status = status_of(app, id).await;
        if status.both_finished() {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("simulation {id} did not finish in time");
}
