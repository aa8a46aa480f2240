//! metadfs shared types
//!
//! Data model and wire payloads shared by the registry, metadata node, and
//! gateway services, plus the path normalization contract both the gateway
//! and the node must apply identically.

pub mod api;
pub mod metadata;
pub mod path;
pub mod wire;

pub use api::{ApiError, ErrorResponse};
pub use metadata::FileMetadata;
pub use path::normalize_path;
pub use wire::{NodeDirectory, RegisterRequest};
