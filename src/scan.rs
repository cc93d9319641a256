//! Thumbnail scan support: processed/cooldown tracking and concurrent
//! lookup fan-out.
//!
//! The DOM walking itself belongs to the embedder. This module owns the
//! contract that matters to the stats layer: every newly-claimed thumbnail
//! spawns one independent lookup, so a single scan pass over a busy page
//! fans out dozens of simultaneous `fetch_video_stats` calls — the load
//! the host-side batcher exists to coalesce.

use crate::client::{LookupClient, VideoData};
use crate::thumbnail;
use dashmap::DashMap;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default cooldown before a failed thumbnail may be rescanned.
pub const DEFAULT_FAIL_RETRY: Duration = Duration::from_secs(5 * 60);

/// Per-thumbnail processing marker.
#[derive(Clone, Copy, Debug)]
enum ThumbMark {
    /// Claimed by a scan pass (in progress or done).
    Processed,
    /// Lookup failed; claimable again once the instant passes.
    RetryAfter(Instant),
}

/// Concurrent processed/cooldown markers keyed by video id.
#[derive(Debug)]
pub struct ScanTracker {
    marks: DashMap<String, ThumbMark>,
    fail_retry: Duration,
}

impl ScanTracker {
    pub fn new(fail_retry: Duration) -> Self {
        Self {
            marks: DashMap::new(),
            fail_retry,
        }
    }

    /// Claim a video id for processing.
    ///
    /// Returns `false` when already claimed, or failed and still cooling
    /// down. A single entry-API operation, so two concurrent claims for
    /// one id cannot both win.
    pub fn try_claim(&self, video_id: &str) -> bool {
        let mut claimed = false;
        self.marks
            .entry(video_id.to_string())
            .and_modify(|mark| {
                if let ThumbMark::RetryAfter(at) = *mark
                    && Instant::now() >= at
                {
                    *mark = ThumbMark::Processed;
                    claimed = true;
                }
            })
            .or_insert_with(|| {
                claimed = true;
                ThumbMark::Processed
            });
        claimed
    }

    /// Record a failed lookup; the id becomes claimable after the cooldown.
    pub fn mark_failed(&self, video_id: &str) {
        self.marks.insert(
            video_id.to_string(),
            ThumbMark::RetryAfter(Instant::now() + self.fail_retry),
        );
    }

    /// Number of tracked ids.
    pub fn tracked_count(&self) -> usize {
        self.marks.len()
    }
}

impl Default for ScanTracker {
    fn default() -> Self {
        Self::new(DEFAULT_FAIL_RETRY)
    }
}

/// Outcome of one thumbnail in a scan pass.
#[derive(Clone, Debug)]
pub struct ScanOutcome {
    pub video_id: String,
    /// `None` after the lookup's retry budget ran out; the tracker holds a
    /// cooldown so a later pass can try again.
    pub data: Option<VideoData>,
}

/// Scan-pass driver: claims thumbnails and fans lookups out concurrently.
pub struct Scanner {
    client: Arc<LookupClient>,
    tracker: Arc<ScanTracker>,
}

impl Scanner {
    pub fn new(client: LookupClient) -> Self {
        Self::with_tracker(client, ScanTracker::default())
    }

    pub fn with_tracker(client: LookupClient, tracker: ScanTracker) -> Self {
        Self {
            client: Arc::new(client),
            tracker: Arc::new(tracker),
        }
    }

    /// Process one batch of discovered thumbnail URLs.
    ///
    /// URLs without a video id and ids already claimed are skipped;
    /// everything else is looked up concurrently. Failed lookups get a
    /// cooldown marker.
    pub async fn scan<I, S>(&self, thumbnail_urls: I) -> Vec<ScanOutcome>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tasks = Vec::new();
        for url in thumbnail_urls {
            let Ok(video_id) = thumbnail::extract_video_id(url.as_ref()) else {
                continue;
            };
            if !self.tracker.try_claim(&video_id) {
                continue;
            }

            let client = Arc::clone(&self.client);
            let tracker = Arc::clone(&self.tracker);
            tasks.push(tokio::spawn(async move {
                let data = client.fetch_video_stats(&video_id).await;
                if data.is_none() {
                    tracker.mark_failed(&video_id);
                }
                ScanOutcome { video_id, data }
            }));
        }
        debug!("Scan pass: {} new thumbnails", tasks.len());

        join_all(tasks)
            .await
            .into_iter()
            .filter_map(|joined| joined.ok())
            .collect()
    }

    pub fn tracker(&self) -> &ScanTracker {
        &self.tracker
    }
}
