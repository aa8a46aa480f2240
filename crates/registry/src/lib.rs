//! metadfs registry
//!
//! In-memory cluster membership directory. Metadata nodes self-register
//! periodically; entries lazily expire once their heartbeat is older than
//! the liveness TTL. The registry never probes nodes and never reports a
//! node as down — a dead node is simply omitted from the next listing.

pub mod membership;
pub mod server;

pub use membership::{Membership, TTL_SECONDS};
pub use server::{build_router, start_server, AppState};
