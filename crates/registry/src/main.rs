use std::sync::Arc;

use anyhow::Result;
use metadfs_registry::{start_server, AppState, Membership};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let listen_addr =
        std::env::var("REGISTRY_LISTEN_ADDR").unwrap_or_else(|_| "127.0.0.1:9000".to_string());

    let state = AppState {
        membership: Arc::new(Membership::new()),
    };

    start_server(state, &listen_addr).await
}
