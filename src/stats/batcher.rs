//! Request coalescing and batching for statistics lookups.
//!
//! Concurrent lookups for one id share a single upstream request; misses
//! across many ids collect in a short batch window and go upstream as
//! chunked calls. Every failure mode resolves waiters with `None` — the
//! page side owns retry, this layer never errors toward its callers.

use crate::metrics;
use crate::stats::cache::{StatsCache, VideoStats};
use crate::stats::provider::{MAX_IDS_PER_REQUEST, UpstreamProvider};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Default time a fetched entry stays fresh.
pub const DEFAULT_CACHE_DURATION: Duration = Duration::from_secs(600);

/// Default time a batch window stays open collecting ids.
pub const DEFAULT_BATCH_WINDOW: Duration = Duration::from_millis(120);

/// Tunables for [`StatsBatcher`].
#[derive(Clone, Debug)]
pub struct BatcherConfig {
    /// How long fetched statistics stay fresh.
    pub cache_duration: Duration,
    /// Upstream credential. `None` is a valid state: every lookup
    /// resolves `None` without network I/O.
    pub api_key: Option<String>,
    /// How long a batch window collects ids before dispatch.
    pub batch_window: Duration,
    /// Max ids per upstream request.
    pub chunk_size: usize,
}

impl Default for BatcherConfig {
    fn default() -> Self {
        Self {
            cache_duration: DEFAULT_CACHE_DURATION,
            api_key: None,
            batch_window: DEFAULT_BATCH_WINDOW,
            chunk_size: MAX_IDS_PER_REQUEST,
        }
    }
}

type Waiter = oneshot::Sender<Option<VideoStats>>;

/// State serialized behind one mutex: the cache, the pending-waiter map
/// and the open batch window all mutate together.
struct BatchState {
    cache: StatsCache,
    /// Outstanding completion handles per id, in registration order.
    waiters: HashMap<String, Vec<Waiter>>,
    /// Ids collected since the current window was armed, in enqueue order.
    window: Vec<String>,
    window_armed: bool,
    /// Runtime-updatable settings (see [`StatsBatcher::update_settings`]).
    cache_duration: Duration,
    api_key: Option<String>,
}

struct BatcherInner {
    state: Mutex<BatchState>,
    provider: Arc<dyn UpstreamProvider>,
    batch_window: Duration,
    chunk_size: usize,
}

/// Coalescing, batching, TTL-cached front end over an [`UpstreamProvider`].
///
/// Cheap to clone; clones share the cache, waiter map and settings.
#[derive(Clone)]
pub struct StatsBatcher {
    inner: Arc<BatcherInner>,
}

impl StatsBatcher {
    pub fn new(provider: Arc<dyn UpstreamProvider>, config: BatcherConfig) -> Self {
        Self {
            inner: Arc::new(BatcherInner {
                state: Mutex::new(BatchState {
                    cache: StatsCache::new(),
                    waiters: HashMap::new(),
                    window: Vec::new(),
                    window_armed: false,
                    cache_duration: config.cache_duration,
                    api_key: config.api_key,
                }),
                provider,
                batch_window: config.batch_window,
                chunk_size: config.chunk_size.max(1),
            }),
        }
    }

    /// Look up statistics for one video id.
    ///
    /// A fresh cache entry resolves immediately with no network I/O.
    /// Otherwise the call joins the pending-waiter list for the id — an id
    /// already awaiting an upstream response is never fetched twice — and,
    /// for a first request, the current batch window. Resolves once the
    /// id's chunk lands.
    ///
    /// Never errors: upstream failure, missing data and a missing
    /// credential all resolve `None`.
    pub async fn get_stats(&self, video_id: &str) -> Option<VideoStats> {
        let receiver = {
            let mut state = self.inner.state();
            let ttl = state.cache_duration;
            state.cache.evict_expired(ttl);

            if let Some(stats) = state.cache.get(video_id, ttl) {
                metrics::record_cache_hit();
                return Some(stats);
            }
            metrics::record_cache_miss();

            let (tx, rx) = oneshot::channel();
            match state.waiters.get_mut(video_id) {
                // A fetch for this id is already pending — join it.
                Some(list) => list.push(tx),
                None => {
                    state.waiters.insert(video_id.to_string(), vec![tx]);
                    state.window.push(video_id.to_string());
                    if !state.window_armed {
                        state.window_armed = true;
                        let inner = Arc::clone(&self.inner);
                        tokio::spawn(async move {
                            tokio::time::sleep(inner.batch_window).await;
                            inner.flush().await;
                        });
                    }
                }
            }
            rx
        };

        // Sender dropped without a value cannot happen while the batcher is
        // alive; treat it as a failed lookup regardless.
        receiver.await.unwrap_or(None)
    }

    /// Replace the effective cache TTL and/or upstream credential for
    /// subsequent operations. Already-cached entries are not revalidated.
    pub fn update_settings(&self, cache_duration: Option<Duration>, api_key: Option<String>) {
        let mut state = self.inner.state();
        if let Some(ttl) = cache_duration {
            state.cache_duration = ttl;
        }
        if let Some(key) = api_key {
            state.api_key = Some(key);
        }
    }

    /// Number of cached videos (stale entries included until the next
    /// eviction pass). Surfaced by the health endpoint.
    pub fn cached_video_count(&self) -> usize {
        self.inner.state().cache.len()
    }
}

impl BatcherInner {
    fn state(&self) -> MutexGuard<'_, BatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Dispatch the open batch window: chunk the collected ids, issue one
    /// upstream call per chunk in enqueue order, cache what came back and
    /// complete every waiter.
    async fn flush(self: Arc<Self>) {
        let (ids, api_key) = {
            let mut state = self.state();
            state.window_armed = false;
            (std::mem::take(&mut state.window), state.api_key.clone())
        };
        if ids.is_empty() {
            return;
        }

        let Some(api_key) = api_key else {
            debug!(
                "No API credential configured; resolving {} pending lookups empty",
                ids.len()
            );
            let mut state = self.state();
            for id in &ids {
                complete_waiters(&mut state, id, None);
            }
            return;
        };

        for chunk in ids.chunks(self.chunk_size) {
            metrics::record_upstream_request();
            match self.provider.fetch_stats(chunk, &api_key).await {
                Ok(fetched) => {
                    let mut state = self.state();
                    for id in chunk {
                        let stats = fetched.get(id).copied();
                        if let Some(stats) = stats {
                            state.cache.insert(id, stats);
                        }
                        complete_waiters(&mut state, id, stats);
                    }
                }
                Err(e) => {
                    // Chunk failures are independent: this chunk's waiters
                    // resolve empty, the rest of the flush continues.
                    metrics::record_chunk_failure();
                    warn!("Upstream chunk of {} ids failed: {}", chunk.len(), e);
                    let mut state = self.state();
                    for id in chunk {
                        complete_waiters(&mut state, id, None);
                    }
                }
            }
        }
    }
}

/// Complete every waiter registered for `video_id`, in registration order.
fn complete_waiters(state: &mut BatchState, video_id: &str, stats: Option<VideoStats>) {
    if let Some(waiters) = state.waiters.remove(video_id) {
        for waiter in waiters {
            // A dropped receiver just means the caller stopped caring.
            let _ = waiter.send(stats);
        }
    }
}
