//! The cross-boundary message protocol endpoint.
//!
//! Page-side callers POST a query-tagged envelope; `getStats` answers the
//! statistics object or JSON `null`, `updateSettings` answers `true`.
//! Lookup failures never surface as HTTP errors — the null body IS the
//! failure signal, and retry policy lives entirely with the caller.

use crate::{metrics, server::state::AppState};
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Protocol request envelope, tagged by `query`.
#[derive(Debug, Deserialize)]
#[serde(tag = "query", rename_all = "camelCase")]
pub enum MessageRequest {
    /// Look up like/view statistics for one video.
    #[serde(rename_all = "camelCase")]
    GetStats { video_id: String },
    /// Replace the runtime cache TTL and/or upstream credential.
    #[serde(rename_all = "camelCase")]
    UpdateSettings {
        /// New cache TTL in milliseconds
        #[serde(default)]
        cache_duration: Option<u64>,
        /// New upstream API credential
        #[serde(default)]
        api_key: Option<String>,
    },
}

/// Handle one protocol message.
pub async fn handle_message(
    State(state): State<AppState>,
    Json(message): Json<MessageRequest>,
) -> Response {
    match message {
        MessageRequest::GetStats { video_id } => {
            metrics::record_message("getStats");
            debug!("getStats for {}", video_id);
            let stats = state.batcher.get_stats(&video_id).await;
            Json(stats).into_response()
        }
        MessageRequest::UpdateSettings {
            cache_duration,
            api_key,
        } => {
            metrics::record_message("updateSettings");
            info!(
                "Updating runtime settings (cacheDuration: {:?} ms, apiKey set: {})",
                cache_duration,
                api_key.is_some()
            );
            state
                .batcher
                .update_settings(cache_duration.map(Duration::from_millis), api_key);
            Json(true).into_response()
        }
    }
}
