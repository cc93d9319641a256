//! Host-side statistics subsystem: TTL cache, request coalescing/batching,
//! and the upstream statistics providers.

pub mod batcher;
pub mod cache;
pub mod provider;

pub use batcher::{BatcherConfig, StatsBatcher};
pub use cache::{StatsCache, VideoStats};
pub use provider::{StaticStatsProvider, UpstreamProvider, YouTubeStatsProvider};
