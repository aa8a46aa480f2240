//! Periodic self-registration with the registry.

use std::time::Duration;

use metadfs_types::RegisterRequest;
use tracing::{debug, warn};

const REGISTER_TIMEOUT: Duration = Duration::from_secs(3);

/// Re-register this node with the registry on every tick, forever.
///
/// Any failure (registry down, transport error, non-success status) is
/// logged and swallowed; the next tick retries. Registration failure must
/// never affect the node's own request serving.
pub async fn run_heartbeat(
    registry_url: String,
    node_id: String,
    base_url: String,
    interval: Duration,
) {
    let client = match reqwest::Client::builder().timeout(REGISTER_TIMEOUT).build() {
        Ok(client) => client,
        Err(err) => {
            warn!("heartbeat disabled, could not build http client: {err}");
            return;
        }
    };

    let endpoint = format!("{}/register", registry_url.trim_end_matches('/'));
    let request = RegisterRequest { node_id, base_url };
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;
        match client.post(&endpoint).json(&request).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("registered {} with {}", request.node_id, endpoint);
            }
            Ok(response) => {
                warn!(
                    "registry rejected heartbeat for {}: {}",
                    request.node_id,
                    response.status()
                );
            }
            Err(err) => {
                warn!("heartbeat for {} failed: {err}", request.node_id);
            }
        }
    }
}
