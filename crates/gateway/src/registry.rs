//! Client for the registry's node directory.

use std::collections::BTreeMap;
use std::time::Duration;

use metadfs_types::NodeDirectory;
use reqwest::Client;

const REGISTRY_TIMEOUT: Duration = Duration::from_secs(3);

/// Fetches the current live node set. The gateway keeps no membership
/// state of its own; every request re-queries the registry.
pub struct RegistryClient {
    client: Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(REGISTRY_TIMEOUT).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn fetch_nodes(&self) -> Result<BTreeMap<String, String>, reqwest::Error> {
        let directory: NodeDirectory = self
            .client
            .get(format!("{}/nodes", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(directory
            .nodes
            .into_iter()
            .map(|(id, url)| (id, url.trim_end_matches('/').to_string()))
            .collect())
    }
}
