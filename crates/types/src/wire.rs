//! JSON payloads exchanged between the services.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Heartbeat registration sent by a metadata node to the registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub node_id: String,
    pub base_url: String,
}

/// The registry's view of the live cluster: `node_id -> base_url`, plus
/// the liveness TTL so callers can reason about staleness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDirectory {
    pub nodes: BTreeMap<String, String>,
    pub ttl_seconds: u64,
}
