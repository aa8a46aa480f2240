//! HTTP surface of the gateway.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::{Path as AxumPath, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use metadfs_types::{normalize_path, ApiError};
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::cache::ReadCache;
use crate::registry::RegistryClient;
use crate::routing::{forward_with_fallback, ForwardOutcome, RouteError};

const NODE_TIMEOUT: Duration = Duration::from_secs(5);
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

pub struct AppState {
    registry: RegistryClient,
    cache: ReadCache,
    /// Client for forwarded metadata operations and listing.
    node_client: Client,
    /// Shorter-fused client for best-effort stats probes.
    probe_client: Client,
}

type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(registry_url: &str, cache_ttl: Duration) -> Result<Self> {
        Ok(Self {
            registry: RegistryClient::new(registry_url)
                .context("failed to build registry client")?,
            cache: ReadCache::new(cache_ttl),
            node_client: Client::builder()
                .timeout(NODE_TIMEOUT)
                .build()
                .context("failed to build node client")?,
            probe_client: Client::builder()
                .timeout(PROBE_TIMEOUT)
                .build()
                .context("failed to build probe client")?,
        })
    }

    async fn live_nodes(&self) -> Result<BTreeMap<String, String>, ApiError> {
        self.registry
            .fetch_nodes()
            .await
            .map_err(|err| ApiError::service_unavailable(format!("registry unreachable: {err}")))
    }
}

#[derive(Debug, Deserialize)]
struct CreateFileRequest {
    file_id: String,
    owner: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default = "default_prefix")]
    prefix: String,
}

fn default_prefix() -> String {
    "/".to_string()
}

#[derive(Debug, Serialize)]
struct NodesResponse {
    nodes: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct InvalidateResponse {
    ok: bool,
    file_id: String,
}

#[derive(Debug, Serialize)]
struct ListFilesResponse {
    count: usize,
    items: Vec<Value>,
    prefix: String,
}

pub async fn start_server(state: AppState, addr: &str) -> Result<()> {
    let shared = Arc::new(state);
    let app = build_router(shared);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind gateway listener on {addr}"))?;
    info!("gateway listening on {addr}");
    axum::serve(listener, app)
        .await
        .context("gateway server terminated unexpectedly")
}

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/nodes", get(handle_nodes))
        .route("/stats", get(handle_stats))
        .route("/cache/invalidate/*file_id", post(handle_invalidate))
        .route("/files", get(handle_list_files).post(handle_create_file))
        .route(
            "/files/*file_id",
            get(handle_get_file).delete(handle_delete_file),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn route_error(err: RouteError) -> ApiError {
    ApiError::service_unavailable(err.to_string())
}

async fn handle_nodes(State(state): State<SharedState>) -> Result<Json<NodesResponse>, ApiError> {
    let nodes = state.live_nodes().await?;
    Ok(Json(NodesResponse { nodes }))
}

/// Best-effort scatter-gather: each node reports its own stats, errors
/// and unreachable nodes are marked per node, the call never fails as a
/// whole because of one node.
async fn handle_stats(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let nodes = state.live_nodes().await?;

    let probes = nodes.iter().map(|(node_id, base_url)| {
        let client = &state.probe_client;
        async move {
            let result = match client.get(format!("{base_url}/stats")).send().await {
                Ok(response) if response.status() == StatusCode::OK => {
                    response.json::<Value>().await.unwrap_or_else(
                        |err| json!({"status": "error", "detail": err.to_string()}),
                    )
                }
                Ok(response) => json!({"status": "error", "code": response.status().as_u16()}),
                Err(_) => json!({"status": "down"}),
            };
            (node_id.clone(), result)
        }
    });

    let out: serde_json::Map<String, Value> = futures::future::join_all(probes)
        .await
        .into_iter()
        .collect();
    Ok(Json(Value::Object(out)))
}

async fn handle_invalidate(
    State(state): State<SharedState>,
    AxumPath(file_id): AxumPath<String>,
) -> Json<InvalidateResponse> {
    let file_id = normalize_path(&file_id);
    state.cache.invalidate(&file_id);
    Json(InvalidateResponse { ok: true, file_id })
}

/// Scatter-gather listing over every live node. A node that errors or is
/// unreachable is silently skipped, so the result can under-report while
/// part of the cluster is down.
async fn handle_list_files(
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListFilesResponse>, ApiError> {
    let prefix = normalize_path(&query.prefix);
    let nodes = state.live_nodes().await?;

    let queries = nodes.iter().map(|(node_id, base_url)| {
        let client = &state.node_client;
        let prefix = &prefix;
        async move {
            let response = client
                .get(format!("{base_url}/metadata"))
                .query(&[("prefix", prefix.as_str())])
                .send()
                .await
                .ok()?;
            if response.status() != StatusCode::OK {
                return None;
            }
            let data = response.json::<Value>().await.ok()?;
            let items = data.get("items")?.as_array()?.clone();
            Some((node_id.clone(), items))
        }
    });

    let mut results = Vec::new();
    for gathered in futures::future::join_all(queries).await.into_iter().flatten() {
        let (node_id, items) = gathered;
        for mut item in items {
            if let Some(obj) = item.as_object_mut() {
                obj.insert("node_id".to_string(), node_id.clone().into());
            }
            results.push(item);
        }
    }

    Ok(Json(ListFilesResponse {
        count: results.len(),
        items: results,
        prefix,
    }))
}

async fn handle_create_file(
    State(state): State<SharedState>,
    Json(req): Json<CreateFileRequest>,
) -> Result<Json<Value>, ApiError> {
    let file_id = normalize_path(&req.file_id);

    // Conservative invalidation: drop the cached entry before the write
    // is attempted, so nothing stale survives an upstream write that
    // partially succeeded before failing.
    state.cache.invalidate(&file_id);

    let nodes = state.live_nodes().await?;
    let payload = json!({"file_id": file_id, "owner": req.owner, "size": req.size});

    match forward_with_fallback(&state.node_client, Method::PUT, &file_id, &nodes, Some(&payload))
        .await
        .map_err(route_error)?
    {
        ForwardOutcome::Success(data) => Ok(Json(data)),
        ForwardOutcome::NotFound { .. } => Err(ApiError::not_found("Not found")),
    }
}

async fn handle_get_file(
    State(state): State<SharedState>,
    AxumPath(file_id): AxumPath<String>,
) -> Result<Json<Value>, ApiError> {
    let file_id = normalize_path(&file_id);

    if let Some(mut cached) = state.cache.get(&file_id) {
        if let Some(obj) = cached.as_object_mut() {
            obj.insert("cache".to_string(), "HIT".into());
        }
        return Ok(Json(cached));
    }

    let nodes = state.live_nodes().await?;
    match forward_with_fallback(&state.node_client, Method::GET, &file_id, &nodes, None)
        .await
        .map_err(route_error)?
    {
        ForwardOutcome::Success(mut data) => {
            if let Some(obj) = data.as_object_mut() {
                obj.insert("cache".to_string(), "MISS".into());
            }
            state.cache.put(&file_id, data.clone());
            Ok(Json(data))
        }
        ForwardOutcome::NotFound { .. } => Err(ApiError::not_found("Not found")),
    }
}

async fn handle_delete_file(
    State(state): State<SharedState>,
    AxumPath(file_id): AxumPath<String>,
) -> Result<Json<Value>, ApiError> {
    let file_id = normalize_path(&file_id);
    let nodes = state.live_nodes().await?;

    match forward_with_fallback(&state.node_client, Method::DELETE, &file_id, &nodes, None)
        .await
        .map_err(route_error)?
    {
        ForwardOutcome::Success(data) => {
            state.cache.invalidate(&file_id);
            Ok(Json(data))
        }
        ForwardOutcome::NotFound { .. } => Err(ApiError::not_found("Not found")),
    }
}
