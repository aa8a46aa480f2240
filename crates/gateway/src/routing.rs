//! Hash-based node ordering and fallback forwarding.

use std::collections::BTreeMap;

use reqwest::{Client, Method, StatusCode};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// Routing failures surfaced to the caller. A 404 from a node is not an
/// error here — it is an authoritative answer (see [`ForwardOutcome`]).
#[derive(thiserror::Error, Debug)]
pub enum RouteError {
    #[error("no metadata nodes available")]
    NoNodesAvailable,
    #[error("all metadata nodes unreachable; last error: {last_error}")]
    AllNodesUnreachable { last_error: String },
}

/// Result of walking the fallback chain.
#[derive(Debug)]
pub enum ForwardOutcome {
    /// The first responding node answered 404. Authoritative: the walk
    /// stops, later candidates are not consulted.
    NotFound { routed_to: String },
    /// A node answered successfully; `routed_to` is attached to the body.
    Success(serde_json::Value),
}

/// Deterministic visit order for `file_id` over the live node set.
///
/// The sorted node ids form a stable base sequence; the SHA-256 of the
/// file id, taken as a big integer mod the node count, picks the rotation
/// offset. For a fixed membership set every file id maps to the same
/// primary and the same fallback order. Membership changes reshuffle
/// placement for most keys; that is the documented trade-off of this
/// scheme, not a bug.
pub fn ordered_nodes(file_id: &str, nodes: &BTreeMap<String, String>) -> Vec<String> {
    if nodes.is_empty() {
        return Vec::new();
    }
    let ids: Vec<String> = nodes.keys().cloned().collect();
    let digest = Sha256::digest(file_id.as_bytes());
    let start = digest_mod(&digest, ids.len());

    let mut order = Vec::with_capacity(ids.len());
    order.extend_from_slice(&ids[start..]);
    order.extend_from_slice(&ids[..start]);
    order
}

/// Reduce a digest, read as a big-endian integer, modulo `modulus`.
/// Byte folding gives the same residue as full 256-bit arithmetic.
fn digest_mod(digest: &[u8], modulus: usize) -> usize {
    let m = modulus as u128;
    let mut acc: u128 = 0;
    for &byte in digest {
        acc = (acc * 256 + byte as u128) % m;
    }
    acc as usize
}

/// Walk the fallback chain for `file_id`, issuing `method` against each
/// candidate's `/metadata/{file_id}` until one answers.
///
/// A 404 stops the walk as an authoritative NotFound. Any other error
/// status or transport failure is recorded and the next candidate is
/// tried; exhaustion yields [`RouteError::AllNodesUnreachable`] carrying
/// the last observed error. An empty live set fails immediately without
/// any network call.
pub async fn forward_with_fallback(
    client: &Client,
    method: Method,
    file_id: &str,
    nodes: &BTreeMap<String, String>,
    payload: Option<&serde_json::Value>,
) -> Result<ForwardOutcome, RouteError> {
    let order = ordered_nodes(file_id, nodes);
    if order.is_empty() {
        return Err(RouteError::NoNodesAvailable);
    }

    let mut last_error = String::from("no candidate attempted");
    for node_id in order {
        let base = nodes[&node_id].trim_end_matches('/');
        let url = format!("{base}/metadata{file_id}");

        let mut request = client.request(method.clone(), &url);
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        match request.send().await {
            Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                debug!("{node_id} answered 404 for {file_id}");
                return Ok(ForwardOutcome::NotFound { routed_to: node_id });
            }
            Ok(response) if response.status().as_u16() >= 400 => {
                let status = response.status();
                let text = response.text().await.unwrap_or_default();
                warn!("{node_id} failed {file_id} with {status}, trying next candidate");
                last_error = format!("{status}: {text}");
            }
            Ok(response) => match response.json::<serde_json::Value>().await {
                Ok(mut data) => {
                    if let Some(obj) = data.as_object_mut() {
                        obj.insert("routed_to".to_string(), node_id.clone().into());
                    }
                    return Ok(ForwardOutcome::Success(data));
                }
                Err(err) => {
                    warn!("{node_id} returned an undecodable body for {file_id}: {err}");
                    last_error = err.to_string();
                }
            },
            Err(err) => {
                warn!("{node_id} unreachable for {file_id}: {err}");
                last_error = err.to_string();
            }
        }
    }

    Err(RouteError::AllNodesUnreachable { last_error })
}
