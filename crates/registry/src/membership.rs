//! Heartbeat-driven membership map with lazy TTL expiry.

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// How long a node stays listed after its last heartbeat.
pub const TTL_SECONDS: u64 = 30;

#[derive(Debug, Clone)]
struct NodeRecord {
    base_url: String,
    last_seen: Instant,
}

/// The registry's only state: `node_id -> NodeRecord` behind one coarse
/// lock. Both `register` and the sweep-and-read in `live_nodes` run in
/// bounded time with no I/O under the lock.
pub struct Membership {
    ttl: Duration,
    nodes: Mutex<HashMap<String, NodeRecord>>,
}

impl Membership {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(TTL_SECONDS))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            nodes: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl.as_secs()
    }

    /// Upsert a node record, refreshing its heartbeat. Idempotent; the
    /// last writer for a given `node_id` wins.
    pub fn register(&self, node_id: &str, base_url: &str) {
        self.register_at(node_id, base_url, Instant::now());
    }

    fn register_at(&self, node_id: &str, base_url: &str, now: Instant) {
        let mut nodes = self.nodes.lock();
        nodes.insert(
            node_id.to_string(),
            NodeRecord {
                base_url: base_url.trim_end_matches('/').to_string(),
                last_seen: now,
            },
        );
    }

    /// Purge every record whose heartbeat is older than the TTL, then
    /// return the surviving `node_id -> base_url` entries.
    pub fn live_nodes(&self) -> BTreeMap<String, String> {
        self.live_nodes_at(Instant::now())
    }

    fn live_nodes_at(&self, now: Instant) -> BTreeMap<String, String> {
        let mut nodes = self.nodes.lock();
        nodes.retain(|_, rec| now.duration_since(rec.last_seen) <= self.ttl);
        nodes
            .iter()
            .map(|(id, rec)| (id.clone(), rec.base_url.clone()))
            .collect()
    }
}

impl Default for Membership {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_list() {
        let membership = Membership::new();
        membership.register("node-a", "http://127.0.0.1:9101");
        membership.register("node-b", "http://127.0.0.1:9102/");

        let nodes = membership.live_nodes();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes["node-a"], "http://127.0.0.1:9101");
        // trailing slash trimmed on registration
        assert_eq!(nodes["node-b"], "http://127.0.0.1:9102");
    }

    #[test]
    fn reregistration_last_writer_wins() {
        let membership = Membership::new();
        membership.register("node-a", "http://127.0.0.1:9101");
        membership.register("node-a", "http://127.0.0.1:9999");

        let nodes = membership.live_nodes();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes["node-a"], "http://127.0.0.1:9999");
    }

    #[test]
    fn stale_nodes_expire_on_listing() {
        let membership = Membership::with_ttl(Duration::from_secs(30));
        let t0 = Instant::now();
        membership.register_at("node-a", "http://127.0.0.1:9101", t0);
        membership.register_at("node-b", "http://127.0.0.1:9102", t0);

        // node-b heartbeats again, node-a goes silent
        let t1 = t0 + Duration::from_secs(20);
        membership.register_at("node-b", "http://127.0.0.1:9102", t1);

        // just inside node-a's TTL: both still listed
        let nodes = membership.live_nodes_at(t0 + Duration::from_secs(30));
        assert_eq!(nodes.len(), 2);

        // past node-a's TTL: only node-b survives
        let nodes = membership.live_nodes_at(t0 + Duration::from_secs(31));
        assert_eq!(nodes.len(), 1);
        assert!(nodes.contains_key("node-b"));
    }

    #[test]
    fn expiry_is_permanent_until_next_heartbeat() {
        let membership = Membership::with_ttl(Duration::from_secs(30));
        let t0 = Instant::now();
        membership.register_at("node-a", "http://127.0.0.1:9101", t0);

        assert!(membership
            .live_nodes_at(t0 + Duration::from_secs(60))
            .is_empty());

        // a fresh heartbeat brings it back
        membership.register_at("node-a", "http://127.0.0.1:9101", t0 + Duration::from_secs(61));
        let nodes = membership.live_nodes_at(t0 + Duration::from_secs(62));
        assert_eq!(nodes.len(), 1);
    }
}
