use std::time::Duration;

use anyhow::Result;
use metadfs_gateway::{start_server, AppState};
use tracing_subscriber::EnvFilter;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let listen_addr = env_or("GATEWAY_LISTEN_ADDR", "127.0.0.1:8000");
    let registry_url = env_or("REGISTRY_URL", "http://127.0.0.1:9000");
    let cache_ttl = env_or("CACHE_TTL_SECS", "20").parse::<u64>().unwrap_or(20);

    let state = AppState::new(&registry_url, Duration::from_secs(cache_ttl))?;
    start_server(state, &listen_addr).await
}
