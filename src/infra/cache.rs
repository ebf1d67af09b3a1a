//! Short-lived in-memory snapshot cache, keyed by item id.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::CityMarketStat;

/// Cache TTL: 5 minutes. Market prices move fast; stale advice is bad advice.
pub const SNAPSHOT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

struct Entry {
    stats: Vec<CityMarketStat>,
    built_at: Instant,
}

/// In-memory TTL cache for per-item snapshots. The domain core stays
/// oblivious to caching; this belongs to the calling layer and hands out
/// clones of the immutable stats.
pub struct SnapshotCache {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns the cached snapshot for `item_id` if it is still fresh.
    pub async fn get(&self, item_id: &str) -> Option<Vec<CityMarketStat>> {
        let entries = self.entries.lock().await;
        entries
            .get(item_id)
            .filter(|entry| entry.built_at.elapsed() <= self.ttl)
            .map(|entry| {
                debug!(item_id, "snapshot cache hit");
                entry.stats.clone()
            })
    }

    pub async fn put(&self, item_id: &str, stats: Vec<CityMarketStat>) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            item_id.to_string(),
            Entry {
                stats,
                built_at: Instant::now(),
            },
        );
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(SNAPSHOT_CACHE_TTL)
    }
}
