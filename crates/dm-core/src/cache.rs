use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dm_fetch::{FetchError, Fetcher};
use serde_json::Value;
use tokio::sync::OnceCell;

type Slot = Arc<OnceCell<Arc<Value>>>;

/// Session-wide memo of parsed documents, keyed by physical path.
///
/// A path is fetched at most once until [`FetchCache::clear`]. Concurrent
/// callers for the same uncached path share a single in-flight fetch.
/// Failures are never cached.
pub struct FetchCache {
    fetcher: Arc<dyn Fetcher>,
    slots: Mutex<HashMap<String, Slot>>,
}

impl FetchCache {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, path: &str) -> Result<Arc<Value>, FetchError> {
        let slot = self.slot(path);
        if let Some(value) = slot.get() {
            return Ok(Arc::clone(value));
        }

        let loaded = slot
            .get_or_try_init(|| async { self.fetcher.fetch(path).await.map(Arc::new) })
            .await;

        match loaded {
            Ok(value) => Ok(Arc::clone(value)),
            Err(e) => {
                if e.is_not_found() {
                    tracing::debug!("Failed to load {}: {}", path, e);
                } else {
                    tracing::warn!("Failed to load {}: {}", path, e);
                }
                self.evict_empty(path, &slot);
                Err(e)
            }
        }
    }

    /// Drop every entry; returns how many documents were cached
    pub fn clear(&self) -> usize {
        let mut slots = self.lock();
        let cached = slots.values().filter(|s| s.initialized()).count();
        slots.clear();
        tracing::info!("Cleared {} cached resources", cached);
        cached
    }

    pub fn contains(&self, path: &str) -> bool {
        self.lock().get(path).is_some_and(|s| s.initialized())
    }

    /// Number of cached documents
    pub fn len(&self) -> usize {
        self.lock().values().filter(|s| s.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, path: &str) -> Slot {
        let mut slots = self.lock();
        Arc::clone(slots.entry(path.to_string()).or_default())
    }

    fn evict_empty(&self, path: &str, slot: &Slot) {
        let mut slots = self.lock();
        if let Some(current) = slots.get(path)
            && Arc::ptr_eq(current, slot)
            && !current.initialized()
        {
            slots.remove(path);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
