//! Page-side lookup client.
//!
//! Bridges thumbnail processing to the stats host over the message
//! protocol, masking transient failures with bounded randomized retry.
//! The jitter matters: when a page full of thumbnails fails at once, the
//! spread keeps their retries from arriving in lockstep.

use crate::rating;
use crate::stats::VideoStats;
use rand::Rng;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Default retry budget after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Default minimum delay between attempts in milliseconds.
pub const DEFAULT_RETRY_DELAY_MIN_MS: u64 = 3000;

/// Default width of the uniform random extension of each delay.
pub const DEFAULT_RETRY_JITTER_MS: u64 = 3000;

/// Retry policy for [`LookupClient::fetch_video_stats`].
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Minimum sleep between attempts.
    pub min_delay: Duration,
    /// Each sleep is extended by `uniform(0, jitter)`.
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            min_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MIN_MS),
            jitter: Duration::from_millis(DEFAULT_RETRY_JITTER_MS),
        }
    }
}

/// Statistics shaped for the rendering layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoData {
    pub likes: u64,
    pub views: u64,
    /// Like/view ratio in `0..=1`; zero views rates as 0.
    pub rating: f64,
}

impl VideoData {
    fn from_stats(stats: VideoStats) -> Self {
        Self {
            likes: stats.likes,
            views: stats.views,
            rating: rating::rating(stats.likes, stats.views),
        }
    }
}

/// Client for the host-side message endpoint.
#[derive(Clone, Debug)]
pub struct LookupClient {
    http_client: Client,
    /// Full URL of the host `/message` endpoint
    message_url: String,
    retry: RetryPolicy,
}

impl LookupClient {
    pub fn new(message_url: String) -> Self {
        Self::with_policy(message_url, RetryPolicy::default())
    }

    pub fn with_policy(message_url: String, retry: RetryPolicy) -> Self {
        Self {
            http_client: Client::new(),
            message_url,
            retry,
        }
    }

    /// Fetch like/view statistics for a video, retrying transient failures.
    ///
    /// Returns `None` once the retry budget is exhausted — at most
    /// `max_retries + 1` requests are issued. A later scan pass may call
    /// again; this client keeps no per-id state.
    pub async fn fetch_video_stats(&self, video_id: &str) -> Option<VideoData> {
        for attempt in 0..=self.retry.max_retries {
            if let Some(stats) = self.request_stats(video_id).await {
                return Some(VideoData::from_stats(stats));
            }
            if attempt < self.retry.max_retries {
                tokio::time::sleep(self.retry_delay()).await;
            }
        }
        warn!(
            "Giving up on stats for {} after {} attempts",
            video_id,
            self.retry.max_retries + 1
        );
        None
    }

    /// Forward an `updateSettings` message; returns the host acknowledgement
    /// (`false` when the host is unreachable).
    pub async fn update_settings(
        &self,
        cache_duration: Option<Duration>,
        api_key: Option<String>,
    ) -> bool {
        let body = json!({
            "query": "updateSettings",
            "cacheDuration": cache_duration.map(|d| d.as_millis() as u64),
            "apiKey": api_key,
        });
        match self.http_client.post(&self.message_url).json(&body).send().await {
            Ok(response) if response.status().is_success() => {
                response.json().await.unwrap_or(false)
            }
            _ => false,
        }
    }

    /// One `getStats` round trip. Any failure — transport, HTTP status,
    /// body shape — reads as "no data yet".
    async fn request_stats(&self, video_id: &str) -> Option<VideoStats> {
        let body = json!({ "query": "getStats", "videoId": video_id });

        let response = match self.http_client.post(&self.message_url).json(&body).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Stats request for {} failed: {}", video_id, e);
                return None;
            }
        };
        if !response.status().is_success() {
            debug!(
                "Stats request for {} returned {}",
                video_id,
                response.status()
            );
            return None;
        }

        match response.json::<Option<VideoStats>>().await {
            Ok(stats) => stats,
            Err(e) => {
                debug!("Stats response for {} unreadable: {}", video_id, e);
                None
            }
        }
    }

    fn retry_delay(&self) -> Duration {
        let jitter_ms = self.retry.jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_ms)
        };
        self.retry.min_delay + Duration::from_millis(jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            min_delay: Duration::from_millis(1),
            jitter: Duration::from_millis(1),
        }
    }

    fn client_for(server: &MockServer, max_retries: u32) -> LookupClient {
        LookupClient::with_policy(format!("{}/message", server.uri()), fast_policy(max_retries))
    }

    #[tokio::test]
    async fn returns_video_data_with_rating() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/message"))
            .and(body_partial_json(serde_json::json!({
                "query": "getStats",
                "videoId": "dQw4w9WgXcQ"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "likes": 100,
                "views": 13050
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, 0);
        let data = client.fetch_video_stats("dQw4w9WgXcQ").await.unwrap();

        assert_eq!(data.likes, 100);
        assert_eq!(data.views, 13050);
        assert!((data.rating - 100.0 / 13050.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn zero_views_rates_zero() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "likes": 0,
                "views": 0
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, 0);
        let data = client.fetch_video_stats("abc").await.unwrap();
        assert_eq!(data.rating, 0.0);
    }

    #[tokio::test]
    async fn retries_until_budget_exhausted() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
            .mount(&server)
            .await;

        let client = client_for(&server, 3);
        assert_eq!(client.fetch_video_stats("abc").await, None);

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 4, "Initial attempt + 3 retries");
    }

    #[tokio::test]
    async fn recovers_after_transient_null() {
        let server = MockServer::start().await;

        // Success fallback (mounted first, lower priority)
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "likes": 5,
                "views": 100
            })))
            .mount(&server)
            .await;

        // Null on the first hit only
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        let client = client_for(&server, 2);
        let data = client.fetch_video_stats("abc").await;
        assert!(data.is_some(), "Expected recovery after one null result");
    }

    #[tokio::test]
    async fn http_error_counts_as_no_data() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server, 1);
        assert_eq!(client.fetch_video_stats("abc").await, None);

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 2);
    }

    #[tokio::test]
    async fn update_settings_returns_ack() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "query": "updateSettings",
                "apiKey": "abc123"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(true))
            .mount(&server)
            .await;

        let client = client_for(&server, 0);
        assert!(
            client
                .update_settings(Some(Duration::from_secs(900)), Some("abc123".to_string()))
                .await
        );
    }

    #[tokio::test]
    async fn update_settings_false_when_unreachable() {
        let client = LookupClient::with_policy(
            "http://127.0.0.1:1/message".to_string(),
            fast_policy(0),
        );
        assert!(!client.update_settings(None, None).await);
    }
}
