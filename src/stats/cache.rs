//! Time-expiring video statistics cache.
//!
//! Expiry bookkeeping is an insertion-ordered queue, so eviction scans
//! oldest-first and stops at the first fresh timestamp — amortized
//! O(evicted) per pass, never O(cache size).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::debug;

/// Engagement counts for one video.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStats {
    pub likes: u64,
    pub views: u64,
}

/// A cached statistics entry.
#[derive(Clone, Copy, Debug)]
struct CachedEntry {
    stats: VideoStats,
    fetched_at: Instant,
}

/// TTL cache over video statistics, keyed by video id.
///
/// Not internally synchronized: the batcher owns one instance behind its
/// state mutex, which serializes all access.
#[derive(Debug, Default)]
pub struct StatsCache {
    entries: HashMap<String, CachedEntry>,
    /// (insertion time, id) pairs in insertion order, oldest at the front.
    insertions: VecDeque<(Instant, String)>,
}

impl StatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh entry for `video_id`, if any.
    pub fn get(&self, video_id: &str, ttl: Duration) -> Option<VideoStats> {
        match self.entries.get(video_id) {
            Some(entry) if entry.fetched_at.elapsed() < ttl => {
                debug!("Stats cache HIT for {}", video_id);
                Some(entry.stats)
            }
            _ => {
                debug!("Stats cache MISS for {}", video_id);
                None
            }
        }
    }

    /// Insert or refresh the entry for `video_id`.
    pub fn insert(&mut self, video_id: &str, stats: VideoStats) {
        let now = Instant::now();
        self.entries.insert(
            video_id.to_string(),
            CachedEntry {
                stats,
                fetched_at: now,
            },
        );
        self.insertions.push_back((now, video_id.to_string()));
    }

    /// Drop entries older than `ttl`.
    ///
    /// A refreshed id leaves its old queue slot behind, so the live entry's
    /// own `fetched_at` is re-checked before removal — a refresh is never
    /// evicted on its predecessor's timestamp.
    pub fn evict_expired(&mut self, ttl: Duration) {
        while self
            .insertions
            .front()
            .is_some_and(|(inserted_at, _)| inserted_at.elapsed() >= ttl)
        {
            let Some((_, video_id)) = self.insertions.pop_front() else {
                break;
            };
            let expired = self
                .entries
                .get(&video_id)
                .is_some_and(|entry| entry.fetched_at.elapsed() >= ttl);
            if expired {
                self.entries.remove(&video_id);
            }
        }
    }

    /// Number of stored entries, stale ones included until the next
    /// eviction pass.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
