use std::env;
use std::time::Duration;
use url::Url;

/// Default upstream statistics endpoint (YouTube Data API v3 `videos`).
const DEFAULT_API_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/videos";

/// Upstream statistics provider selection
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderType {
    /// YouTube Data API v3 compatible endpoint (default when a key is configured)
    YouTube,
    /// Deterministic local statistics, no network (default for dev without a key)
    Static,
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub is_dev: bool,
    /// Upstream statistics endpoint (`videos` resource shape)
    pub api_endpoint: Url,
    /// Upstream API credential; absence is a valid state that degrades
    /// every lookup to a null result
    pub api_key: Option<String>,
    /// How long fetched statistics stay fresh
    pub cache_duration: Duration,
    /// How long a batch window collects ids before dispatch
    pub batch_window: Duration,
    /// Max ids per upstream request (upstream API limit)
    pub chunk_size: usize,
    /// Provider selection
    pub provider_type: ProviderType,
}

impl Config {
    /// Load configuration from environment variables
    /// In DEV mode, provides sensible defaults. In PROD mode, PORT is required.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        // Check if running in dev mode
        let is_dev = env::var("DEV_MODE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        // Port: required in prod, defaults to 3000 in dev
        let port = if is_dev {
            env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?
        } else {
            env::var("PORT")
                .map_err(|_| "PORT is required in production")?
                .parse()?
        };

        // Upstream endpoint: defaults to the public YouTube Data API
        let api_endpoint = Url::parse(
            &env::var("STATS_API_ENDPOINT").unwrap_or_else(|_| DEFAULT_API_ENDPOINT.to_string()),
        )?;

        // Credential (optional): no key is expected and valid
        let mut api_key = env::var("STATS_API_KEY").ok().filter(|k| !k.is_empty());

        // Provider: auto-detect from credential, or explicit STATS_PROVIDER
        let provider_type = match env::var("STATS_PROVIDER")
            .unwrap_or_else(|_| "auto".to_string())
            .to_lowercase()
            .as_str()
        {
            "youtube" => ProviderType::YouTube,
            "static" => ProviderType::Static,
            _ => {
                // Auto-detect: use the real API when a key is configured;
                // dev mode falls back to deterministic local stats
                if api_key.is_some() || !is_dev {
                    ProviderType::YouTube
                } else {
                    ProviderType::Static
                }
            }
        };

        // The static provider needs no real credential; substitute a
        // placeholder so lookups are not short-circuited to null
        if provider_type == ProviderType::Static && api_key.is_none() {
            api_key = Some("static".to_string());
        }

        // Cache TTL: defaults to 10 minutes
        let cache_duration_ms: u64 = env::var("CACHE_DURATION_MS")
            .unwrap_or_else(|_| "600000".to_string())
            .parse()
            .unwrap_or(600_000);

        // Batch window: defaults to 120 ms
        let batch_window_ms: u64 = env::var("BATCH_WINDOW_MS")
            .unwrap_or_else(|_| "120".to_string())
            .parse()
            .unwrap_or(120);

        // Chunk size: defaults to the upstream API limit of 50 ids
        let chunk_size: usize = env::var("BATCH_CHUNK_SIZE")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .unwrap_or(50);

        Ok(Config {
            port,
            is_dev,
            api_endpoint,
            api_key,
            cache_duration: Duration::from_millis(cache_duration_ms),
            batch_window: Duration::from_millis(batch_window_ms),
            chunk_size: chunk_size.max(1),
            provider_type,
        })
    }
}
