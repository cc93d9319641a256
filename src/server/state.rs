use crate::config::{Config, ProviderType};
use crate::stats::{
    BatcherConfig, StatsBatcher, StaticStatsProvider, UpstreamProvider, YouTubeStatsProvider,
};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    /// Shared HTTP client for connection pooling
    pub http_client: Client,
    /// Coalescing/batching statistics front end
    pub batcher: StatsBatcher,
    /// Server start time, reported by /health
    pub started_at: Instant,
}

impl AppState {
    /// Create a new AppState with the given configuration
    pub fn new(config: Config) -> Self {
        let http_client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .expect("Failed to create HTTP client");

        let provider: Arc<dyn UpstreamProvider> = match config.provider_type {
            ProviderType::YouTube => Arc::new(YouTubeStatsProvider::new(
                http_client.clone(),
                config.api_endpoint.clone(),
            )),
            ProviderType::Static => Arc::new(StaticStatsProvider::new()),
        };

        let batcher = StatsBatcher::new(
            provider,
            BatcherConfig {
                cache_duration: config.cache_duration,
                api_key: config.api_key.clone(),
                batch_window: config.batch_window,
                chunk_size: config.chunk_size,
            },
        );

        Self {
            config: Arc::new(config),
            http_client,
            batcher,
            started_at: Instant::now(),
        }
    }
}
