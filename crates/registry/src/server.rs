//! HTTP surface of the registry service.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use metadfs_types::{ApiError, NodeDirectory, RegisterRequest};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};
use url::Url;

use crate::membership::Membership;

#[derive(Clone)]
pub struct AppState {
    pub membership: Arc<Membership>,
}

type SharedState = Arc<AppState>;

#[derive(Debug, Serialize)]
struct RegisterResponse {
    status: &'static str,
}

pub async fn start_server(state: AppState, addr: &str) -> Result<()> {
    let shared = Arc::new(state);
    let app = build_router(shared);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind registry listener on {addr}"))?;
    info!("registry listening on {addr}");
    axum::serve(listener, app)
        .await
        .context("registry server terminated unexpectedly")
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/register", post(handle_register))
        .route("/nodes", get(handle_nodes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handle_register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    Url::parse(&req.base_url)
        .map_err(|err| ApiError::bad_request(format!("invalid base_url: {err}")))?;

    debug!("heartbeat from {} at {}", req.node_id, req.base_url);
    state.membership.register(&req.node_id, &req.base_url);
    Ok(Json(RegisterResponse { status: "ok" }))
}

async fn handle_nodes(State(state): State<SharedState>) -> Json<NodeDirectory> {
    Json(NodeDirectory {
        nodes: state.membership.live_nodes(),
        ttl_seconds: state.membership.ttl_seconds(),
    })
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
            membership: Arc::new(Membership::new()),
        };
        build_router(Arc::new(state))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn register_then_list() {
        let app = test_router();

        let register = Request::builder()
            .method("POST")
            .uri("/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                r#"{"node_id":"node-a","base_url":"http://127.0.0.1:9101"}"#,
            ))
            .unwrap();
        let response = app.clone().oneshot(register).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");

        let list = Request::builder().uri("/nodes").body(Body::empty()).unwrap();
        let response = app.oneshot(list).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["nodes"]["node-a"], "http://127.0.0.1:9101");
        assert_eq!(body["ttl_seconds"], 30);
    }

    #[tokio::test]
    async fn rejects_malformed_base_url() {
        let app = test_router();

        let register = Request::builder()
            .method("POST")
            .uri("/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"node_id":"node-a","base_url":"not a url"}"#))
            .unwrap();
        let response = app.clone().oneshot(register).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let list = Request::builder().uri("/nodes").body(Body::empty()).unwrap();
        let response = app.oneshot(list).await.unwrap();
        let body = body_json(response).await;
        assert!(body["nodes"].as_object().unwrap().is_empty());
    }
}
