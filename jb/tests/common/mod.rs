//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Canned response for one method and path
#[derive(Clone)]
pub struct Route {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl Route {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A request the fake API received
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

struct ApiState {
    routes: HashMap<(String, String), Route>,
    seen: Mutex<Vec<Seen>>,
}

/// Local axum server standing in for the job board API
pub struct FakeApi {
    pub base_url: String,
    state: Arc<ApiState>,
    task: JoinHandle<()>,
}

impl FakeApi {
    pub async fn start(routes: Vec<(&str, &str, Route)>) -> Self {
        let state = Arc::new(ApiState {
            routes: routes
                .into_iter()
                .map(|(method, path, route)| ((method.to_string(), path.to_string()), route))
                .collect(),
            seen: Mutex::default(),
        });
        let app = Router::new().fallback(respond).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let addr = listener.local_addr().expect("No local addr");
        let task = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
            task,
        }
    }

    pub fn requests(&self) -> Vec<Seen> {
        self.state.seen.lock().unwrap().clone()
    }

    pub fn hits(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|s| s.method == method && s.path == path)
            .count()
    }
}

impl Drop for FakeApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Record every request, then answer from the route table (404 when unknown)
async fn respond(
    State(state): State<Arc<ApiState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or(uri.path()).to_string();
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.seen.lock().unwrap().push(Seen {
        method: method.to_string(),
        path: path.clone(),
        authorization,
        body,
    });

    let route = state
        .routes
        .get(&(method.to_string(), path))
        .cloned()
        .unwrap_or_else(|| Route::json(404, serde_json::json!({"message": "Not found"})));
    tokio::time::sleep(route.delay).await;

    let status = StatusCode::from_u16(route.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], route.body).into_response()
}

/// Job document as the API returns it
pub fn job_json(id: &str, title: &str) -> serde_json::Value {
    serde_json::json!({
        "_id": id,
        "title": title,
        "description": "Work on things",
        "company": "Acme",
        "location": "Remote",
        "type": "full-time",
        "salary": {"min": 90000, "max": 120000},
        "skills": ["rust", "tokio"],
        "createdBy": {"_id": "e1", "name": "Erin", "company": "Acme"},
        "isActive": true,
        "applicationCount": 3,
        "createdAt": "2025-03-01T10:00:00.000Z"
    })
}
