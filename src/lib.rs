//! Like/view statistics host and page-side lookup support.
//!
//! The host side (axum) answers `getStats` protocol messages from a
//! coalescing, batching, TTL-cached front end over an upstream statistics
//! API. The page side gets a retrying [`client::LookupClient`] plus the
//! thumbnail-scan helpers that fan out into it.

pub mod client;
pub mod config;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod scan;
pub mod server;
pub mod stats;
pub mod thumbnail;
