//! metadfs metadata node
//!
//! The authoritative store for whatever subset of the file namespace
//! routes to it. Writes to the same path are fully serialized by a
//! per-path lock nested outside the store lock, so versions advance
//! monotonically with no gaps; reads take only the store lock and never
//! observe a half-written record. A background heartbeat keeps the node
//! registered with the registry; heartbeat failures are never fatal.

pub mod heartbeat;
pub mod server;
pub mod store;

pub use heartbeat::run_heartbeat;
pub use server::{build_router, start_server, AppState};
pub use store::MetadataStore;
