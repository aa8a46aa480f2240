//! metadfs gateway
//!
//! Stateless entry point over a dynamic, possibly-partially-failed node
//! set. On every request it asks the registry for the live node set,
//! derives a deterministic visit order for the target path from a SHA-256
//! rotation, and forwards to nodes in that order until one answers
//! authoritatively or all are exhausted. Holds a TTL read cache but never
//! any authoritative data.

pub mod cache;
pub mod registry;
pub mod routing;
pub mod server;

pub use cache::ReadCache;
pub use registry::RegistryClient;
pub use routing::{forward_with_fallback, ordered_nodes, ForwardOutcome, RouteError};
pub use server::{build_router, start_server, AppState};
