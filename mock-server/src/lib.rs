//! Mock document-management API server.
//!
//! # Design
//! Implements the vendor envelope contract (`responseStatus`, `errors`,
//! `responseDetails` with `next_page`/`previous_page` cursors, per-row
//! batch outcomes) over in-memory state, so the client core can be
//! exercised end-to-end without a real tenant. Application-level failures
//! are returned as HTTP 200 envelopes with status FAILURE, matching the
//! vendor. Documents are keyed in a `BTreeMap` so collection order — and
//! therefore pagination — is deterministic.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const API_VERSION: &str = "v25.1";

#[derive(Clone, Debug)]
pub struct StoredDocument {
    pub id: i64,
    pub name: String,
    pub document_type: String,
    pub lifecycle: String,
    pub status: String,
    pub major_version: i32,
    pub minor_version: i32,
    /// Role name → assigned user ids.
    pub roles: BTreeMap<String, Vec<i64>>,
    /// Source file bytes served by the download endpoint.
    pub file: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct StoredJob {
    pub id: i64,
    pub title: String,
    pub status: String,
}

#[derive(Debug, Default)]
pub struct ServerState {
    documents: BTreeMap<i64, StoredDocument>,
    jobs: BTreeMap<i64, StoredJob>,
    next_document_id: i64,
}

impl ServerState {
    pub fn new() -> Self {
        let mut jobs = BTreeMap::new();
        jobs.insert(
            1001,
            StoredJob {
                id: 1001,
                title: "Nightly audit export".to_string(),
                status: "SUCCESS".to_string(),
            },
        );
        jobs.insert(
            1002,
            StoredJob {
                id: 1002,
                title: "Metadata migration".to_string(),
                status: "RUNNING".to_string(),
            },
        );
        Self {
            documents: BTreeMap::new(),
            jobs,
            next_document_id: 1,
        }
    }

    fn create_document(&mut self, name: String, document_type: String, lifecycle: String) -> i64 {
        let id = self.next_document_id;
        self.next_document_id += 1;
        let mut roles = BTreeMap::new();
        roles.insert("owner__v".to_string(), vec![1]);
        let mut file = format!("%DOC mock source file for document {id}\n").into_bytes();
        file.extend_from_slice(&[0x00, 0xff, 0x10, 0x04]);
        self.documents.insert(
            id,
            StoredDocument {
                id,
                name,
                document_type,
                lifecycle,
                status: "draft__c".to_string(),
                major_version: 0,
                minor_version: 1,
                roles,
                file,
            },
        );
        id
    }
}

pub type Db = Arc<RwLock<ServerState>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(ServerState::new()));
    let protected = Router::new()
        .route(
            "/api/v25.1/objects/documents",
            get(list_documents).post(create_document),
        )
        .route(
            "/api/v25.1/objects/documents/{id}",
            get(get_document).delete(delete_document),
        )
        .route(
            "/api/v25.1/objects/documents/{id}/file",
            get(download_document_file),
        )
        .route(
            "/api/v25.1/objects/documents/{id}/roles",
            get(get_document_roles).post(assign_document_roles),
        )
        .route(
            "/api/v25.1/objects/documents/roles/batch",
            post(assign_roles_batch).delete(remove_roles_batch),
        )
        .route("/api/v25.1/services/jobs/monitors", get(list_job_monitors))
        .route("/api/v25.1/services/jobs/{id}", get(get_job))
        .layer(middleware::from_fn(require_session))
        .with_state(db);

    Router::new()
        .route("/api/v25.1/auth", post(authenticate))
        .merge(protected)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// Every route except `auth` requires a non-empty `Authorization` header.
async fn require_session(req: Request, next: Next) -> Response {
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| !v.is_empty())
        .unwrap_or(false);
    if authorized {
        next.run(req).await
    } else {
        Json(failure("INVALID_SESSION_ID", "Invalid or expired session ID")).into_response()
    }
}

async fn authenticate() -> Json<Value> {
    Json(json!({
        "responseStatus": "SUCCESS",
        "sessionId": Uuid::new_v4().to_string(),
        "userId": 1,
    }))
}

#[derive(Deserialize)]
struct PageParams {
    limit: Option<usize>,
    offset: Option<usize>,
}

#[derive(Deserialize)]
struct CreateDocument {
    #[serde(rename = "name__v")]
    name: String,
    #[serde(rename = "type__v", default)]
    document_type: Option<String>,
    #[serde(rename = "lifecycle__v", default)]
    lifecycle: Option<String>,
}

async fn list_documents(State(db): State<Db>, Query(params): Query<PageParams>) -> Json<Value> {
    let state = db.read().await;
    let docs: Vec<Value> = state.documents.values().map(document_json).collect();
    Json(paginated(
        &format!("/api/{API_VERSION}/objects/documents"),
        docs,
        params.limit,
        params.offset,
    ))
}

async fn create_document(
    State(db): State<Db>,
    Form(input): Form<CreateDocument>,
) -> Json<Value> {
    let mut state = db.write().await;
    let id = state.create_document(
        input.name,
        input.document_type.unwrap_or_else(|| "document__c".to_string()),
        input.lifecycle.unwrap_or_else(|| "general_lifecycle__c".to_string()),
    );
    Json(json!({
        "responseStatus": "SUCCESS",
        "responseMessage": "Successfully created document",
        "id": id,
    }))
}

async fn get_document(State(db): State<Db>, Path(id): Path<i64>) -> Json<Value> {
    let state = db.read().await;
    match state.documents.get(&id) {
        Some(doc) => Json(json!({
            "responseStatus": "SUCCESS",
            "data": document_json(doc),
        })),
        None => Json(document_not_found(id)),
    }
}

async fn delete_document(State(db): State<Db>, Path(id): Path<i64>) -> Json<Value> {
    let mut state = db.write().await;
    match state.documents.remove(&id) {
        Some(_) => Json(json!({
            "responseStatus": "SUCCESS",
            "data": { "id": id },
        })),
        None => Json(document_not_found(id)),
    }
}

async fn download_document_file(
    State(db): State<Db>,
    Path(id): Path<i64>,
) -> Response {
    let state = db.read().await;
    match state.documents.get(&id) {
        Some(doc) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            doc.file.clone(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn get_document_roles(State(db): State<Db>, Path(id): Path<i64>) -> Json<Value> {
    let state = db.read().await;
    match state.documents.get(&id) {
        Some(doc) => {
            let roles: Vec<Value> = doc
                .roles
                .iter()
                .map(|(name, users)| {
                    json!({
                        "name": name,
                        "label": role_label(name),
                        "assignedUsers": users,
                        "assignedGroups": [],
                    })
                })
                .collect();
            Json(json!({
                "responseStatus": "SUCCESS",
                "documentRoles": roles,
            }))
        }
        None => Json(document_not_found(id)),
    }
}

async fn assign_document_roles(
    State(db): State<Db>,
    Path(id): Path<i64>,
    Form(params): Form<BTreeMap<String, String>>,
) -> Json<Value> {
    let mut state = db.write().await;
    let doc = match state.documents.get_mut(&id) {
        Some(doc) => doc,
        None => return Json(document_not_found(id)),
    };
    let mut updated = serde_json::Map::new();
    for (key, value) in &params {
        // Keys look like "editor__v.users"; values are comma-separated ids.
        let (role, kind) = match key.split_once('.') {
            Some(parts) => parts,
            None => continue,
        };
        if kind != "users" {
            continue;
        }
        let ids: Vec<i64> = value
            .split(',')
            .filter_map(|part| part.trim().parse().ok())
            .collect();
        let members = doc.roles.entry(role.to_string()).or_default();
        for user in &ids {
            if !members.contains(user) {
                members.push(*user);
            }
        }
        updated.insert(role.to_string(), json!({ "users": ids }));
    }
    Json(json!({
        "responseStatus": "SUCCESS",
        "updatedRoles": updated,
    }))
}

async fn assign_roles_batch(State(db): State<Db>, body: String) -> Json<Value> {
    roles_batch(db, body, true).await
}

async fn remove_roles_batch(State(db): State<Db>, body: String) -> Json<Value> {
    roles_batch(db, body, false).await
}

/// Apply a CSV of `id,role,member` rows, producing one outcome entry per
/// input row in input order. Row failures never fail the batch envelope.
async fn roles_batch(db: Db, body: String, assign: bool) -> Json<Value> {
    let rows = csv_data_rows(&body);
    if rows.is_empty() {
        return Json(failure("INVALID_DATA", "CSV input contained no data rows"));
    }
    let mut state = db.write().await;
    let mut outcomes = Vec::with_capacity(rows.len());
    for cells in rows {
        let id: Option<i64> = cells.first().and_then(|c| c.parse().ok());
        let role = cells.get(1).cloned().unwrap_or_default();
        let member: Option<i64> = cells.get(2).and_then(|c| c.parse().ok());

        let (id, doc) = match id {
            Some(id) => match state.documents.get_mut(&id) {
                Some(doc) => (id, doc),
                None => {
                    outcomes.push(json!({
                        "id": id,
                        "responseStatus": "FAILURE",
                        "errors": [{ "type": "INVALID_DATA", "message": format!("document {id} does not exist") }],
                    }));
                    continue;
                }
            },
            None => {
                outcomes.push(json!({
                    "responseStatus": "FAILURE",
                    "errors": [{ "type": "INVALID_DATA", "message": "row is missing a document id" }],
                }));
                continue;
            }
        };

        let members = doc.roles.entry(role.clone()).or_default();
        let member_ids = match member {
            Some(m) => vec![m],
            None => Vec::new(),
        };
        if assign {
            for m in &member_ids {
                if !members.contains(m) {
                    members.push(*m);
                }
            }
        } else {
            members.retain(|m| !member_ids.contains(m));
        }
        let mut outcome = serde_json::Map::new();
        outcome.insert("id".to_string(), json!(id));
        outcome.insert("responseStatus".to_string(), json!("SUCCESS"));
        outcome.insert(format!("{role}.users"), json!(member_ids));
        outcomes.push(Value::Object(outcome));
    }
    Json(json!({
        "responseStatus": "SUCCESS",
        "data": outcomes,
    }))
}

async fn get_job(State(db): State<Db>, Path(id): Path<i64>) -> Json<Value> {
    let state = db.read().await;
    match state.jobs.get(&id) {
        Some(job) => Json(json!({
            "responseStatus": "SUCCESS",
            "data": job_json(job),
        })),
        None => Json(failure(
            "INVALID_DATA",
            &format!("job {id} does not exist"),
        )),
    }
}

async fn list_job_monitors(
    State(db): State<Db>,
    Query(params): Query<PageParams>,
) -> Json<Value> {
    let state = db.read().await;
    let jobs: Vec<Value> = state.jobs.values().map(job_json).collect();
    Json(paginated(
        &format!("/api/{API_VERSION}/services/jobs/monitors"),
        jobs,
        params.limit,
        params.offset,
    ))
}

fn document_json(doc: &StoredDocument) -> Value {
    json!({
        "id": doc.id,
        "name__v": doc.name,
        "type__v": doc.document_type,
        "lifecycle__v": doc.lifecycle,
        "status__v": doc.status,
        "major_version_number__v": doc.major_version,
        "minor_version_number__v": doc.minor_version,
        "archive__v": false,
    })
}

fn job_json(job: &StoredJob) -> Value {
    json!({
        "job_id": job.id,
        "title": job.title,
        "status": job.status,
    })
}

fn role_label(name: &str) -> String {
    let stem = name.trim_end_matches("__v").trim_end_matches("__c");
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Page an item list into a SUCCESS envelope, attaching cursors exactly
/// when more rows exist on that side.
fn paginated(path: &str, items: Vec<Value>, limit: Option<usize>, offset: Option<usize>) -> Value {
    let limit = limit.unwrap_or(50).max(1);
    let offset = offset.unwrap_or(0);
    let total = items.len();
    let page: Vec<Value> = items.into_iter().skip(offset).take(limit).collect();
    let size = page.len();

    let mut details = json!({
        "limit": limit,
        "offset": offset,
        "size": size,
        "total": total,
    });
    if offset + size < total {
        details["next_page"] = json!(format!("{path}?limit={limit}&offset={}", offset + limit));
    }
    if offset > 0 {
        let previous = offset.saturating_sub(limit);
        details["previous_page"] = json!(format!("{path}?limit={limit}&offset={previous}"));
    }

    json!({
        "responseStatus": "SUCCESS",
        "responseDetails": details,
        "data": page,
    })
}

/// Split CSV text into trimmed data rows, dropping an `id,...` header row.
fn csv_data_rows(body: &str) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.split(',').map(|cell| cell.trim().to_string()).collect())
        .collect();
    if rows
        .first()
        .and_then(|cells| cells.first())
        .map(|cell| cell == "id")
        .unwrap_or(false)
    {
        rows.remove(0);
    }
    rows
}

fn failure(error_type: &str, message: &str) -> Value {
    json!({
        "responseStatus": "FAILURE",
        "errors": [{ "type": error_type, "message": message }],
    })
}

fn document_not_found(id: i64) -> Value {
    failure("INVALID_DATA", &format!("document {id} does not exist"))
}
