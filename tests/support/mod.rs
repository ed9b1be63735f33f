//! In-process stand-in for the todo service.
//!
//! Speaks the same routes and `{ meta, data }` envelope as the real backend, keeps
//! items in memory, records every request, and can be told to fail.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, patch},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};

#[derive(Default)]
pub struct StubState {
    todos: Mutex<Vec<Value>>,
    next_id: AtomicU64,
    /// Consumed by the next mutation, which then answers with this status and message.
    fail_next: Mutex<Option<(u16, String)>>,
    /// While set, list requests answer with this status.
    list_failure: Mutex<Option<u16>>,
    requests: Mutex<Vec<String>>,
}

pub struct Stub {
    pub base_url: String,
    pub state: Arc<StubState>,
}

impl Stub {
    pub async fn start() -> Stub {
        let state = Arc::new(StubState::default());
        let app = Router::new()
            .route("/todos", get(list).post(create))
            .route("/todos/complete-batches", patch(complete_all))
            .route("/todos/completed", delete(clear_completed))
            .route("/todos/{id}", patch(update).delete(remove))
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Stub {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    /// Insert an item directly, bypassing the API.
    pub fn seed(&self, title: &str, completed: bool) -> String {
        let id = self.state.next_id();
        let now = Utc::now().to_rfc3339();
        self.state.todos.lock().unwrap().push(json!({
            "id": id,
            "title": title,
            "completed": completed,
            "completed_at": if completed { json!(now) } else { Value::Null },
            "created_at": now,
            "updated_at": now,
        }));
        id
    }

    pub fn fail_next(&self, status: u16, message: &str) {
        *self.state.fail_next.lock().unwrap() = Some((status, message.to_string()));
    }

    pub fn fail_lists(&self, status: Option<u16>) {
        *self.state.list_failure.lock().unwrap() = status;
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn clear_requests(&self) {
        self.state.requests.lock().unwrap().clear();
    }

    pub fn todos(&self) -> Vec<Value> {
        self.state.todos.lock().unwrap().clone()
    }
}

impl StubState {
    fn next_id(&self) -> String {
        (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    fn take_failure(&self) -> Option<Response> {
        self.fail_next
            .lock()
            .unwrap()
            .take()
            .map(|(status, message)| envelope(status, json!({ "message": message })))
    }
}

fn envelope(status: u16, data: Value) -> Response {
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        code,
        Json(json!({
            "meta": { "status": status, "timestamp": Utc::now().to_rfc3339() },
            "data": data,
        })),
    )
        .into_response()
}

async fn record(State(state): State<Arc<StubState>>, req: Request, next: Next) -> Response {
    let line = format!("{} {}", req.method(), req.uri().path());
    state.requests.lock().unwrap().push(line);
    next.run(req).await
}

async fn list(State(state): State<Arc<StubState>>) -> Response {
    if let Some(status) = *state.list_failure.lock().unwrap() {
        return envelope(status, json!({ "message": "list unavailable" }));
    }
    let todos = state.todos.lock().unwrap().clone();
    envelope(200, Value::Array(todos))
}

async fn create(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    if let Some(failure) = state.take_failure() {
        return failure;
    }
    let title = body["title"].as_str().unwrap_or_default().to_string();
    if title.trim().is_empty() {
        return envelope(400, json!({ "message": "title is required" }));
    }
    if title.chars().count() > 200 {
        return envelope(400, json!({ "message": "title is too long" }));
    }
    let now = Utc::now().to_rfc3339();
    let item = json!({
        "id": state.next_id(),
        "title": title,
        "completed": false,
        "completed_at": null,
        "created_at": now,
        "updated_at": now,
    });
    state.todos.lock().unwrap().push(item.clone());
    envelope(201, item)
}

async fn update(
    State(state): State<Arc<StubState>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(failure) = state.take_failure() {
        return failure;
    }
    let mut todos = state.todos.lock().unwrap();
    let Some(item) = todos.iter_mut().find(|t| t["id"] == id.as_str()) else {
        return envelope(404, json!({ "message": "todo not found" }));
    };
    if body["completed"] == true {
        let now = Utc::now().to_rfc3339();
        item["completed"] = json!(true);
        item["completed_at"] = json!(now);
        item["updated_at"] = json!(now);
    }
    envelope(200, item.clone())
}

async fn remove(State(state): State<Arc<StubState>>, Path(id): Path<String>) -> Response {
    if let Some(failure) = state.take_failure() {
        return failure;
    }
    let mut todos = state.todos.lock().unwrap();
    let before = todos.len();
    todos.retain(|t| t["id"] != id.as_str());
    if todos.len() == before {
        return envelope(404, json!({ "message": "todo not found" }));
    }
    envelope(200, Value::Null)
}

async fn complete_all(State(state): State<Arc<StubState>>) -> Response {
    if let Some(failure) = state.take_failure() {
        return failure;
    }
    let now = Utc::now().to_rfc3339();
    for item in state.todos.lock().unwrap().iter_mut() {
        if item["completed"] == false {
            item["completed"] = json!(true);
            item["completed_at"] = json!(now);
            item["updated_at"] = json!(now);
        }
    }
    envelope(200, Value::Null)
}

async fn clear_completed(State(state): State<Arc<StubState>>) -> Response {
    if let Some(failure) = state.take_failure() {
        return failure;
    }
    state
        .todos
        .lock()
        .unwrap()
        .retain(|t| t["completed"] != true);
    envelope(200, Value::Null)
}
