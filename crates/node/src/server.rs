//! HTTP surface of the metadata node.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path as AxumPath, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use metadfs_types::{ApiError, FileMetadata};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::store::MetadataStore;

#[derive(Clone)]
pub struct AppState {
    pub node_id: String,
    pub store: Arc<MetadataStore>,
}

type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    node_id: String,
}

#[derive(Debug, Serialize)]
struct StatsResponse {
    node_id: String,
    files: usize,
    paths: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ListResponse {
    count: usize,
    items: Vec<FileMetadata>,
    node_id: String,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default = "default_prefix")]
    prefix: String,
}

fn default_prefix() -> String {
    "/".to_string()
}

/// Write payload forwarded by the gateway. The path segment, not the
/// body's `file_id`, decides which record is written.
#[derive(Debug, Deserialize)]
struct PutMetadataRequest {
    #[allow(dead_code)]
    #[serde(default)]
    file_id: String,
    owner: String,
    size: u64,
}

#[derive(Debug, Serialize)]
struct StoredResponse {
    status: &'static str,
    node_id: String,
    version: u64,
}

#[derive(Debug, Serialize)]
struct DeletedResponse {
    status: &'static str,
    node_id: String,
}

pub async fn start_server(state: AppState, addr: &str) -> Result<()> {
    let shared = Arc::new(state);
    let app = build_router(shared);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind node listener on {addr}"))?;
    info!("metadata node listening on {addr}");
    axum::serve(listener, app)
        .await
        .context("metadata node server terminated unexpectedly")
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/stats", get(handle_stats))
        .route("/metadata", get(handle_list))
        .route(
            "/metadata/*file_id",
            get(handle_get).put(handle_put).delete(handle_delete),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_health(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        node_id: state.node_id.clone(),
    })
}

async fn handle_stats(State(state): State<SharedState>) -> Json<StatsResponse> {
    let paths = state.store.keys();
    Json(StatsResponse {
        node_id: state.node_id.clone(),
        files: paths.len(),
        paths,
    })
}

async fn handle_list(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Json<ListResponse> {
    let items = state.store.list(&query.prefix);
    Json(ListResponse {
        count: items.len(),
        items,
        node_id: state.node_id.clone(),
    })
}

async fn handle_put(
    State(state): State<SharedState>,
    AxumPath(file_id): AxumPath<String>,
    Json(req): Json<PutMetadataRequest>,
) -> Json<StoredResponse> {
    let version = state.store.put(&file_id, req.owner, req.size).await;
    Json(StoredResponse {
        status: "stored",
        node_id: state.node_id.clone(),
        version,
    })
}

async fn handle_get(
    State(state): State<SharedState>,
    AxumPath(file_id): AxumPath<String>,
) -> Result<Json<FileMetadata>, ApiError> {
    state
        .store
        .get(&file_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Not found"))
}

async fn handle_delete(
    State(state): State<SharedState>,
    AxumPath(file_id): AxumPath<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    if state.store.delete(&file_id).await {
        Ok(Json(DeletedResponse {
            status: "deleted",
            node_id: state.node_id.clone(),
        }))
    } else {
        Err(ApiError::not_found("Not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let state = AppState {
            node_id: "test-node".to_string(),
            store: Arc::new(MetadataStore::new()),
        };
        build_router(Arc::new(state))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn put_request(uri: &str, owner: &str, size: u64) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(format!(
                r#"{{"file_id":"","owner":"{owner}","size":{size}}}"#
            )))
            .unwrap()
    }

    #[tokio::test]
    async fn put_get_roundtrip() {
        let app = test_router();

        let response = app
            .clone()
            .oneshot(put_request("/metadata/docs/a.txt", "alice", 100))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "stored");
        assert_eq!(body["node_id"], "test-node");
        assert_eq!(body["version"], 1);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metadata/docs/a.txt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["file_id"], "/docs/a.txt");
        assert_eq!(body["owner"], "alice");
        assert_eq!(body["version"], 1);
    }

    #[tokio::test]
    async fn get_missing_returns_404() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/metadata/absent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Not found");
    }

    #[tokio::test]
    async fn delete_then_404() {
        let app = test_router();

        app.clone()
            .oneshot(put_request("/metadata/x", "alice", 1))
            .await
            .unwrap();

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/metadata/x")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "deleted");

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/metadata/x")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_filters_by_prefix() {
        let app = test_router();

        for (path, size) in [("docs/a", 1u64), ("docs/b", 2), ("img/c", 3)] {
            app.clone()
                .oneshot(put_request(&format!("/metadata/{path}"), "alice", size))
                .await
                .unwrap();
        }

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/metadata?prefix=/docs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["node_id"], "test-node");

        // stats reflect all three writes
        let response = app
            .oneshot(Request::builder().uri("/stats").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["files"], 3);
    }
}
