//! In-memory stand-in for the Airlock filtering service.
//!
//! Implements the same HTTP contract as the real service so client tests can
//! run against a live socket. Filtering is a placeholder: ASCII digits are
//! masked with `*`.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const HEALTHY: &str = "Healthy";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Status {
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResponse {
    pub context: Option<String>,
    pub document_id: String,
    pub filtered_text: String,
}

#[derive(Deserialize)]
pub struct ApplyParams {
    pub c: Option<String>,
    pub p: String,
    pub d: Option<String>,
}

/// Policy name to raw policy document. Ordered so listings are stable.
pub type Db = Arc<RwLock<BTreeMap<String, String>>>;

pub fn app() -> Router {
    let db: Db = Arc::default();
    Router::new()
        .route("/api/status", get(status))
        .route("/api/policies", get(list_policies).post(save_policy))
        // The static segment outranks `{name}`, so a policy called "apply"
        // needs its own GET and DELETE here.
        .route(
            "/api/policies/apply",
            post(apply).get(get_apply_policy).delete(delete_apply_policy),
        )
        .route("/api/policies/{name}", get(get_policy).delete(delete_policy))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn status() -> Json<Status> {
    Json(Status {
        status: HEALTHY.to_string(),
    })
}

async fn list_policies(State(db): State<Db>) -> Json<Vec<String>> {
    Json(db.read().await.keys().cloned().collect())
}

/// Stores the body verbatim under its top-level `name`.
async fn save_policy(State(db): State<Db>, body: String) -> Result<StatusCode, StatusCode> {
    let document: Value = serde_json::from_str(&body).map_err(|_| StatusCode::BAD_REQUEST)?;
    let name = document
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .ok_or(StatusCode::BAD_REQUEST)?
        .to_string();
    db.write().await.insert(name, body);
    Ok(StatusCode::OK)
}

async fn get_policy(
    State(db): State<Db>,
    Path(name): Path<String>,
) -> Result<String, StatusCode> {
    lookup(&db, &name).await
}

async fn get_apply_policy(State(db): State<Db>) -> Result<String, StatusCode> {
    lookup(&db, "apply").await
}

async fn lookup(db: &Db, name: &str) -> Result<String, StatusCode> {
    db.read().await.get(name).cloned().ok_or(StatusCode::NOT_FOUND)
}

async fn delete_policy(State(db): State<Db>, Path(name): Path<String>) -> StatusCode {
    remove(&db, &name).await
}

async fn delete_apply_policy(State(db): State<Db>) -> StatusCode {
    remove(&db, "apply").await
}

async fn remove(db: &Db, name: &str) -> StatusCode {
    match db.write().await.remove(name) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

async fn apply(
    State(db): State<Db>,
    Query(params): Query<ApplyParams>,
    text: String,
) -> Result<Json<ApplyResponse>, StatusCode> {
    if !db.read().await.contains_key(&params.p) {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(ApplyResponse {
        context: params.c,
        document_id: params.d.unwrap_or_else(|| Uuid::new_v4().to_string()),
        filtered_text: mask_digits(&text),
    }))
}

fn mask_digits(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_ascii_digit() { '*' } else { c })
        .collect()
}
