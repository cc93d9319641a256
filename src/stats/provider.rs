//! Upstream statistics providers.
//!
//! The batcher talks to an [`UpstreamProvider`] instead of the network
//! directly. This abstraction allows for different statistics sources
//! (the real YouTube-shaped API, deterministic local data for dev mode,
//! counting mocks in tests).

use crate::error::{Result, ThumbrateError};
use crate::stats::cache::VideoStats;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use tracing::debug;
use url::Url;

/// Maximum ids the upstream accepts in one request; the batcher chunks to
/// this by default.
pub const MAX_IDS_PER_REQUEST: usize = 50;

/// Trait for upstream statistics sources.
#[async_trait]
pub trait UpstreamProvider: Send + Sync {
    /// Fetch statistics for up to [`MAX_IDS_PER_REQUEST`] ids in one call.
    ///
    /// Ids absent from the returned map have no published statistics
    /// (deleted, private, not found) — that is data, not an error. An `Err`
    /// means the whole request failed and none of its ids resolved.
    async fn fetch_stats(
        &self,
        video_ids: &[String],
        api_key: &str,
    ) -> Result<HashMap<String, VideoStats>>;
}

/// Wire shape of a `videos?part=statistics` response.
#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    statistics: Option<VideoStatistics>,
}

/// Counts arrive as decimal strings; hidden or missing counts read as zero.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    #[serde(default)]
    like_count: Option<String>,
    #[serde(default)]
    view_count: Option<String>,
}

fn parse_count(raw: Option<&str>) -> u64 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(0)
}

/// Provider backed by a YouTube Data API v3 compatible `videos` endpoint.
#[derive(Clone, Debug)]
pub struct YouTubeStatsProvider {
    /// Shared HTTP client for connection pooling
    http_client: Client,
    /// `videos` resource endpoint, e.g. `https://www.googleapis.com/youtube/v3/videos`
    endpoint: Url,
}

impl YouTubeStatsProvider {
    pub fn new(http_client: Client, endpoint: Url) -> Self {
        Self {
            http_client,
            endpoint,
        }
    }

    fn request_url(&self, video_ids: &[String], api_key: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("part", "statistics")
            .append_pair("id", &video_ids.join(","))
            .append_pair("key", api_key);
        url
    }
}

#[async_trait]
impl UpstreamProvider for YouTubeStatsProvider {
    async fn fetch_stats(
        &self,
        video_ids: &[String],
        api_key: &str,
    ) -> Result<HashMap<String, VideoStats>> {
        let url = self.request_url(video_ids, api_key);
        debug!("Fetching statistics for {} videos", video_ids.len());

        let response = self
            .http_client
            .get(url)
            .send()
            .await?
            .error_for_status()?;

        let body: VideoListResponse = response
            .json()
            .await
            .map_err(|e| ThumbrateError::MalformedResponse(e.to_string()))?;

        let mut stats = HashMap::with_capacity(body.items.len());
        for item in body.items {
            // An item without a statistics block carries no data; its
            // waiters resolve empty like an absent item.
            let Some(statistics) = item.statistics else {
                continue;
            };
            stats.insert(
                item.id,
                VideoStats {
                    likes: parse_count(statistics.like_count.as_deref()),
                    views: parse_count(statistics.view_count.as_deref()),
                },
            );
        }
        Ok(stats)
    }
}

/// Deterministic provider for dev mode and demos: no network, no real
/// credential. Numbers derive from a hash of the video id, so the same id
/// always rates the same.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticStatsProvider;

impl StaticStatsProvider {
    pub fn new() -> Self {
        Self
    }

    fn stats_for(video_id: &str) -> VideoStats {
        let mut hasher = DefaultHasher::new();
        video_id.hash(&mut hasher);
        let h = hasher.finish();

        // Like ratios land in 0..12%, the range real videos live in.
        let views = 1_000 + h % 10_000_000;
        let likes = views * (h % 120) / 1_000;
        VideoStats { likes, views }
    }
}

#[async_trait]
impl UpstreamProvider for StaticStatsProvider {
    async fn fetch_stats(
        &self,
        video_ids: &[String],
        _api_key: &str,
    ) -> Result<HashMap<String, VideoStats>> {
        Ok(video_ids
            .iter()
            .map(|id| (id.clone(), Self::stats_for(id)))
            .collect())
    }
}
