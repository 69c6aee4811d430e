//! Fake triage backend served over real HTTP with axum.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;

pub const GOOD_TOKEN: &str = "good-token";

/// An issue title the categorize route refuses with a 500.
pub const UNTRIAGEABLE: &str = "triage outage";

/// Requests the fake backend received, for assertions.
#[derive(Default)]
pub struct Recorded {
    pub issue_queries: Vec<String>,
    pub triage_bodies: Vec<Value>,
    pub command_bodies: Vec<Value>,
}

pub type SharedRecord = Arc<Mutex<Recorded>>;

fn authorized(headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!("Bearer {}", GOOD_TOKEN);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

async fn repos(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    authorized(&headers)?;
    Ok(Json(json!(["octo/app", "octo/widgets", "tools/cli"])))
}

async fn issues(
    State(record): State<SharedRecord>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, (StatusCode, String)> {
    authorized(&headers).map_err(|status| (status, "bad credential".to_string()))?;
    let repo = params.get("repo").cloned().unwrap_or_default();
    record.lock().unwrap().issue_queries.push(repo.clone());

    match repo.as_str() {
        "octo/app" => Ok(Json(json!([
            {"number": 1, "title": "fix login", "body": "cannot log in", "state": "open"},
            {"number": 2, "title": "typo", "body": null, "state": "open"},
            {"number": 3, "title": "crash on save", "body": "segfault", "state": "open"}
        ]))),
        "octo/untriaged" => Ok(Json(json!([
            {"number": 1, "title": "fix login", "body": "cannot log in", "state": "open"},
            {"number": 2, "title": "typo", "body": null, "state": "open"},
            {"number": 4, "title": UNTRIAGEABLE, "body": null, "state": "open"}
        ]))),
        "octo/broken" => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "upstream exploded".to_string(),
        )),
        "octo/slow" => {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok(Json(json!([])))
        }
        _ => Ok(Json(json!([]))),
    }
}

async fn categorize(
    State(record): State<SharedRecord>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    authorized(&headers)?;
    let fails = body["issue_titles"]
        .as_array()
        .is_some_and(|titles| titles.iter().any(|t| t.as_str() == Some(UNTRIAGEABLE)));
    record.lock().unwrap().triage_bodies.push(body);
    if fails {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    Ok(Json(json!({
        "Major": ["crash on save"],
        "Minor": ["typo"],
        "Bug": []
    })))
}

async fn sort(
    State(record): State<SharedRecord>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    authorized(&headers)?;
    record.lock().unwrap().triage_bodies.push(body);
    Ok(Json(json!(["typo", "fix login"])))
}

async fn run_command(
    State(record): State<SharedRecord>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    authorized(&headers)?;
    let reply = format!(
        "ran {} on #{}",
        body["command"].as_str().unwrap_or_default(),
        body["issue"]["number"]
    );
    record.lock().unwrap().command_bodies.push(body);
    Ok(Json(Value::String(reply)))
}

pub fn router(record: SharedRecord) -> Router {
    Router::new()
        .route("/user/repos", get(repos))
        .route("/issues", get(issues))
        .route("/ai/categorize-issues", post(categorize))
        .route("/ai/sort-issues", post(sort))
        .route("/run-command", post(run_command))
        .with_state(record)
}

/// Serves the fake backend on the current runtime. Returns its base URL.
pub async fn spawn_backend() -> (String, SharedRecord) {
    let record = SharedRecord::default();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(record.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{}", addr), record)
}

/// Serves the fake backend on a dedicated thread, for blocking tests.
pub fn spawn_backend_thread() -> String {
    let (tx, rx) = std::sync::mpsc::channel::<SocketAddr>();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async move {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            let _ = axum::serve(listener, router(SharedRecord::default())).await;
        });
    });
    format!("http://{}", rx.recv().unwrap())
}
