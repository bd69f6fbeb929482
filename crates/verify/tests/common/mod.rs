//! In-process stub of the project-management API
//!
//! Serves the subset of endpoints the harness touches, with just enough
//! state to create entities, file and resolve approvals, and re-fetch the
//! entities afterwards.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use pmapi_verify::{Check, Reporter, Section, SuiteSummary};

pub const TOKEN: &str = "stub-token";
pub const USER_ID: &str = "user-1";
pub const TENANT_ID: &str = "tenant-1";

/// Knobs for misbehaving APIs
#[derive(Debug, Clone, Copy)]
pub struct Behaviour {
    /// Granting an approval moves the entity to its approved status
    pub approval_transitions: bool,
    /// Invoice creation is rejected with 422
    pub reject_invoices: bool,
}

impl Default for Behaviour {
    fn default() -> Self {
        Self {
            approval_transitions: true,
            reject_invoices: false,
        }
    }
}

#[derive(Default)]
struct Store {
    next_id: u64,
    entities: HashMap<String, Value>,
    approvals: HashMap<String, (String, String)>,
    approval_posts: usize,
    requests: usize,
}

impl Store {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }
}

#[derive(Clone)]
struct Stub {
    store: Arc<Mutex<Store>>,
    behaviour: Behaviour,
}

/// Running stub server
pub struct StubApi {
    pub base_url: String,
    store: Arc<Mutex<Store>>,
    handle: JoinHandle<()>,
}

impl StubApi {
    pub async fn spawn(behaviour: Behaviour) -> Self {
        let store = Arc::new(Mutex::new(Store::default()));
        let app = router(Stub {
            store: store.clone(),
            behaviour,
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub listener");
        let addr = listener.local_addr().expect("stub address");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server");
        });

        Self {
            base_url: format!("http://{addr}/api/v1"),
            store,
            handle,
        }
    }

    /// Number of `POST /approval-requests` calls received
    pub fn approval_posts(&self) -> usize {
        self.store.lock().approval_posts
    }

    /// Number of requests received on any endpoint
    pub fn requests(&self) -> usize {
        self.store.lock().requests
    }

    pub fn entity_count(&self) -> usize {
        self.store.lock().entities.len()
    }
}

impl Drop for StubApi {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Reporter that keeps every section for assertions
#[derive(Default)]
pub struct Recorded {
    pub sections: Vec<Section>,
    pub summary: Option<SuiteSummary>,
}

impl Recorded {
    pub fn failed_checks(&self) -> Vec<&Check> {
        self.sections
            .iter()
            .flat_map(|s| &s.checks)
            .filter(|c| c.failed())
            .collect()
    }
}

impl Reporter for Recorded {
    fn section(&mut self, section: &Section) {
        self.sections.push(section.clone());
    }

    fn summary(&mut self, summary: &SuiteSummary) {
        self.summary = Some(summary.clone());
    }
}

/// True when a `curl` executable is on PATH
pub fn curl_available() -> bool {
    std::process::Command::new("curl")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        == Some(&format!("Bearer {TOKEN}")[..])
}

fn unauthorized() -> Response {
    reply(
        StatusCode::UNAUTHORIZED,
        json!({"statusCode": 401, "message": "Unauthorized"}),
    )
}

fn router(stub: Stub) -> Router {
    let api = Router::new()
        .route("/health", get(|| async { Json(json!({"status": "ok"})) }))
        .route("/info", get(|| async { Json(json!({"name": "stub", "version": "1"})) }))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/users/me", get(me))
        .route("/projects", post(create_project).get(list_projects))
        .route("/projects/:id", get(fetch).delete(remove))
        .route("/invoices", post(create_invoice))
        .route("/invoices/:id", get(fetch).delete(remove))
        .route("/tasks", post(create_task))
        .route("/tasks/:id", get(fetch).delete(remove))
        .route("/messages", post(create_message))
        .route("/approval-requests", post(file_approval))
        .route("/approval-requests/:id/status", patch(resolve_approval))
        .route("/analytics/dashboard", get(authed_ok))
        .route("/activity-logs/me", get(authed_ok))
        .route(
            "/echo",
            get(echo_get).post(echo_post).patch(echo_patch).delete(echo_delete),
        )
        .route("/sentinel", get(|| async { Json(json!({"note": "|SEP|weird"})) }))
        .route(
            "/plain",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream exploded") }),
        )
        .layer(axum::middleware::from_fn_with_state(stub.clone(), count_requests))
        .with_state(stub);

    Router::new().nest("/api/v1", api)
}

async fn count_requests(
    State(stub): State<Stub>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    stub.store.lock().requests += 1;
    next.run(request).await
}

async fn register(Json(body): Json<Value>) -> Response {
    if body.get("email").and_then(Value::as_str).is_none() {
        return reply(StatusCode::BAD_REQUEST, json!({"message": "email required"}));
    }
    reply(StatusCode::CREATED, json!({"data": {"_id": USER_ID}}))
}

async fn login(Json(body): Json<Value>) -> Response {
    if body.get("password").and_then(Value::as_str) != Some("Password123!") {
        return unauthorized();
    }
    reply(
        StatusCode::OK,
        json!({"data": {
            "accessToken": TOKEN,
            "user": {"_id": USER_ID, "tenantId": TENANT_ID}
        }}),
    )
}

async fn me(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    reply(
        StatusCode::OK,
        json!({"data": {"_id": USER_ID, "tenantId": TENANT_ID, "email": "stub@example.com"}}),
    )
}

async fn authed_ok(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    reply(StatusCode::OK, json!({"data": {}}))
}

fn create(stub: &Stub, headers: &HeaderMap, prefix: &str, status: &str, body: Value) -> Response {
    if !authorized(headers) {
        return unauthorized();
    }
    let mut store = stub.store.lock();
    let id = store.id(prefix);
    let mut entity = body;
    entity["_id"] = json!(id);
    entity["status"] = json!(status);
    entity["tenantId"] = json!(TENANT_ID);
    store.entities.insert(id, entity.clone());
    reply(StatusCode::CREATED, json!({ "data": entity }))
}

async fn create_project(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    create(&stub, &headers, "project", "active", body)
}

async fn create_invoice(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if stub.behaviour.reject_invoices {
        return reply(
            StatusCode::UNPROCESSABLE_ENTITY,
            json!({"message": ["items must not be empty"]}),
        );
    }
    create(&stub, &headers, "invoice", "draft", body)
}

async fn create_task(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let project = body.get("projectId").and_then(Value::as_str).unwrap_or_default();
    if !stub.store.lock().entities.contains_key(project) {
        return reply(StatusCode::BAD_REQUEST, json!({"message": "unknown project"}));
    }
    create(&stub, &headers, "task", "todo", body)
}

async fn create_message(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    create(&stub, &headers, "message", "sent", body)
}

async fn list_projects(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let search = query.get("search").cloned().unwrap_or_default();
    let store = stub.store.lock();
    let items: Vec<Value> = store
        .entities
        .iter()
        .filter(|(id, _)| id.starts_with("project-"))
        .map(|(_, p)| p.clone())
        .filter(|p| {
            p.get("name")
                .and_then(Value::as_str)
                .is_some_and(|n| n.contains(&search))
        })
        .collect();
    let total = items.len();
    reply(
        StatusCode::OK,
        json!({"data": items, "meta": {"total": total, "page": 1, "limit": 10}}),
    )
}

async fn fetch(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match stub.store.lock().entities.get(&id) {
        Some(entity) => reply(StatusCode::OK, json!({ "data": entity })),
        None => reply(StatusCode::NOT_FOUND, json!({"message": "Not found"})),
    }
}

async fn remove(State(stub): State<Stub>, headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match stub.store.lock().entities.remove(&id) {
        Some(_) => reply(StatusCode::OK, json!({"data": {"deleted": true}})),
        None => reply(StatusCode::NOT_FOUND, json!({"message": "Not found"})),
    }
}

async fn file_approval(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut store = stub.store.lock();
    store.approval_posts += 1;

    let field = |key: &str| body.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
    let approver = field("approverId");
    let entity_type = field("entityType");
    let entity_id = field("entityId");

    if approver != USER_ID {
        return reply(StatusCode::BAD_REQUEST, json!({"message": "unknown approver"}));
    }
    if !store.entities.contains_key(&entity_id) {
        return reply(StatusCode::NOT_FOUND, json!({"message": "entity not found"}));
    }

    let id = store.id("approval");
    store.approvals.insert(id.clone(), (entity_type.clone(), entity_id.clone()));
    reply(
        StatusCode::CREATED,
        json!({"data": {
            "_id": id,
            "status": "pending",
            "entityType": entity_type,
            "entityId": entity_id
        }}),
    )
}

async fn resolve_approval(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut store = stub.store.lock();
    let Some((entity_type, entity_id)) = store.approvals.get(&id).cloned() else {
        return reply(StatusCode::NOT_FOUND, json!({"message": "approval not found"}));
    };
    let status = body.get("status").and_then(Value::as_str).unwrap_or_default().to_string();

    if status == "approved" && stub.behaviour.approval_transitions {
        let next = match entity_type.as_str() {
            "invoice" => Some("sent"),
            "project_deliverable" => Some("completed"),
            "task" => Some("done"),
            _ => None,
        };
        if let (Some(next), Some(entity)) = (next, store.entities.get_mut(&entity_id)) {
            entity["status"] = json!(next);
        }
    }

    reply(StatusCode::OK, json!({"data": {"_id": id, "status": status}}))
}

async fn echo_get() -> Response {
    reply(StatusCode::OK, json!({"method": "GET"}))
}

async fn echo_post(Json(body): Json<Value>) -> Response {
    reply(StatusCode::CREATED, json!({"method": "POST", "payload": body}))
}

async fn echo_patch(Json(body): Json<Value>) -> Response {
    reply(StatusCode::ACCEPTED, json!({"method": "PATCH", "payload": body}))
}

async fn echo_delete() -> Response {
    reply(StatusCode::IM_A_TEAPOT, json!({"method": "DELETE"}))
}
