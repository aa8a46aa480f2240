use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use metadfs_node::{run_heartbeat, start_server, AppState, MetadataStore};
use tracing_subscriber::EnvFilter;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let node_id = env_or("NODE_ID", "node-1");
    let registry_url = env_or("REGISTRY_URL", "http://127.0.0.1:9000");
    let base_url = env_or("NODE_BASE_URL", "http://127.0.0.1:9101");
    let listen_addr = env_or("NODE_LISTEN_ADDR", "127.0.0.1:9101");
    let heartbeat_interval = env_or("HEARTBEAT_INTERVAL_SECS", "10")
        .parse::<u64>()
        .unwrap_or(10);

    tokio::spawn(run_heartbeat(
        registry_url,
        node_id.clone(),
        base_url,
        Duration::from_secs(heartbeat_interval),
    ));

    let state = AppState {
        node_id,
        store: Arc::new(MetadataStore::new()),
    };

    start_server(state, &listen_addr).await
}
