use std::fmt;
use std::sync::Arc;

use dm_types::{Level, Locale, LoadWarning, ResourcePath};
use futures_util::future::join_all;
use serde_json::Value;

use crate::locale::LocaleResolver;
use crate::paths;

/// Number of chunk files holding `total_items` items, `chunk_size` per file
pub fn chunks_needed(total_items: usize, chunk_size: usize) -> usize {
    if chunk_size == 0 {
        return 0;
    }
    total_items.div_ceil(chunk_size)
}

/// How an index resource encodes the item count
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexKind {
    /// An array with one entry per item
    ArrayLength,
    /// A stats object; `fallback` applies when `field` is missing
    CountField { field: String, fallback: usize },
}

impl IndexKind {
    /// Item count described by `index`, `None` if it has the wrong shape
    pub fn total_items(&self, index: &Value) -> Option<usize> {
        match self {
            IndexKind::ArrayLength => index.as_array().map(Vec::len),
            IndexKind::CountField { field, fallback } => {
                let stats = index.as_object()?;
                let count = stats
                    .get(field)
                    .and_then(Value::as_u64)
                    .and_then(|n| usize::try_from(n).ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(*fallback);
                Some(count)
            }
        }
    }
}

/// A logical collection split across numbered chunk files
#[derive(Clone)]
pub struct ChunkedCollection {
    name: String,
    index: ResourcePath,
    kind: IndexKind,
    chunk_size: usize,
    chunk_path: Arc<dyn Fn(usize) -> ResourcePath + Send + Sync>,
}

impl ChunkedCollection {
    pub fn new(
        name: impl Into<String>,
        index: ResourcePath,
        kind: IndexKind,
        chunk_size: usize,
        chunk_path: impl Fn(usize) -> ResourcePath + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            index,
            kind,
            chunk_size,
            chunk_path: Arc::new(chunk_path),
        }
    }

    /// Modules of one level, counted by `vocabulary/{level}/index.json`
    pub fn vocabulary(level: Level, chunk_size: usize) -> Self {
        Self::new(
            format!("vocabulary/{}", level.dir_name()),
            paths::vocabulary_index(level),
            IndexKind::ArrayLength,
            chunk_size,
            move |n| paths::vocabulary_modules(level, n),
        )
    }

    /// All verbs, counted by `totalVerbs` in `verbs/stats.json`
    pub fn verbs(chunk_size: usize, fallback_total: usize) -> Self {
        Self::new(
            "verbs",
            paths::verb_stats(),
            IndexKind::CountField {
                field: "totalVerbs".to_string(),
                fallback: fallback_total,
            },
            chunk_size,
            paths::verb_chunk,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> &ResourcePath {
        &self.index
    }

    pub fn kind(&self) -> &IndexKind {
        &self.kind
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Path of the 1-based chunk `n`
    pub fn chunk_path(&self, n: usize) -> ResourcePath {
        (self.chunk_path)(n)
    }
}

impl fmt::Debug for ChunkedCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedCollection")
            .field("name", &self.name)
            .field("index", &self.index)
            .field("kind", &self.kind)
            .field("chunk_size", &self.chunk_size)
            .finish_non_exhaustive()
    }
}

/// Outcome of loading one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionLoad {
    /// Items of every loaded chunk, in chunk order
    pub items: Vec<Value>,
    /// Count from the index, `None` when the index was unavailable
    pub total_items: Option<usize>,
    pub chunks_requested: usize,
    pub chunks_loaded: usize,
    pub warnings: Vec<LoadWarning>,
}

impl CollectionLoad {
    pub fn index_found(&self) -> bool {
        self.total_items.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.index_found() && self.chunks_loaded == self.chunks_requested
    }

    fn missing_index(collection: &ChunkedCollection) -> Self {
        Self {
            warnings: vec![LoadWarning::MissingIndex {
                collection: collection.name.clone(),
                resource: collection.index.clone(),
            }],
            ..Self::default()
        }
    }
}

/// Chunk files a single collection may span unless configured otherwise
pub const DEFAULT_MAX_CHUNKS: usize = 1_000;

/// Rebuilds chunked collections from their index and numbered chunks
pub struct ChunkedLoader {
    resolver: Arc<LocaleResolver>,
    concurrent: bool,
    max_chunks: usize,
}

impl ChunkedLoader {
    pub fn new(resolver: Arc<LocaleResolver>, concurrent: bool) -> Self {
        Self {
            resolver,
            concurrent,
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }

    /// Indexes describing more than `max_chunks` chunks are treated as malformed
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Load every chunk of `collection` for `locale`.
    ///
    /// A missing index yields an empty collection. A chunk that fails to
    /// load, or is not an array, is skipped. Items keep chunk order whether
    /// chunks are fetched concurrently or one by one.
    pub async fn load(&self, collection: &ChunkedCollection, locale: Locale) -> CollectionLoad {
        let Some(index) = self.resolver.resolve_opt(&collection.index, locale).await else {
            tracing::warn!(
                "Index {} unavailable, {} is empty",
                collection.index,
                collection.name
            );
            return CollectionLoad::missing_index(collection);
        };

        let Some(total_items) = collection.kind.total_items(&index) else {
            tracing::warn!(
                "Index {} has an unexpected shape, {} is empty",
                collection.index,
                collection.name
            );
            return CollectionLoad::missing_index(collection);
        };

        let needed = chunks_needed(total_items, collection.chunk_size);
        if needed > self.max_chunks {
            tracing::warn!(
                "Index {} claims {} items in {} chunks (limit {}), {} is empty",
                collection.index,
                total_items,
                needed,
                self.max_chunks,
                collection.name
            );
            return CollectionLoad::missing_index(collection);
        }

        let chunk_paths: Vec<ResourcePath> =
            (1..=needed).map(|n| collection.chunk_path(n)).collect();

        let chunks = if self.concurrent {
            join_all(
                chunk_paths
                    .iter()
                    .map(|path| self.resolver.resolve(path, locale)),
            )
            .await
        } else {
            let mut chunks = Vec::with_capacity(chunk_paths.len());
            for path in &chunk_paths {
                chunks.push(self.resolver.resolve(path, locale).await);
            }
            chunks
        };

        let mut load = CollectionLoad {
            total_items: Some(total_items),
            chunks_requested: needed,
            ..CollectionLoad::default()
        };

        for (n, (path, chunk)) in chunk_paths.into_iter().zip(chunks).enumerate() {
            let n = n + 1;
            match chunk.as_deref().map(Value::as_array) {
                Ok(Some(items)) => {
                    load.items.extend(items.iter().cloned());
                    load.chunks_loaded += 1;
                    continue;
                }
                Ok(None) => tracing::warn!(
                    "Skipping chunk {} of {}: {} is not an array",
                    n,
                    collection.name,
                    path
                ),
                Err(e) => tracing::warn!("Skipping chunk {} of {}: {}", n, collection.name, e),
            }

            load.warnings.push(LoadWarning::MissingChunk {
                collection: collection.name.clone(),
                chunk: n,
                resource: path,
            });
        }

        tracing::debug!(
            "Loaded {} items of {} from {}/{} chunks",
            load.items.len(),
            collection.name,
            load.chunks_loaded,
            load.chunks_requested
        );
        load
    }
}

#[cfg(test)]
mod tests {
    use dm_fetch::MemoryFetcher;
    use serde_json::json;

    use super::*;
    use crate::cache::FetchCache;

    fn loader(store: &Arc<MemoryFetcher>, concurrent: bool) -> ChunkedLoader {
        let cache = Arc::new(FetchCache::new(store.clone()));
        let resolver = Arc::new(LocaleResolver::new(cache, Locale::It));
        ChunkedLoader::new(resolver, concurrent)
    }

    fn numbered(range: std::ops::Range<usize>) -> Value {
        Value::Array(range.map(|i| json!({ "id": i })).collect())
    }

    fn ids(items: &[Value]) -> Vec<u64> {
        items.iter().filter_map(|v| v["id"].as_u64()).collect()
    }

    #[test]
    fn chunk_math_uses_ceiling_division() {
        assert_eq!(chunks_needed(414, 50), 9);
        assert_eq!(chunks_needed(400, 50), 8);
        assert_eq!(chunks_needed(25, 20), 2);
        assert_eq!(chunks_needed(1, 20), 1);
        assert_eq!(chunks_needed(0, 20), 0);
        assert_eq!(chunks_needed(10, 0), 0);
    }

    #[test]
    fn count_field_falls_back_when_missing() {
        let kind = IndexKind::CountField {
            field: "totalVerbs".into(),
            fallback: 414,
        };
        assert_eq!(kind.total_items(&json!({ "totalVerbs": 120 })), Some(120));
        assert_eq!(kind.total_items(&json!({ "other": 1 })), Some(414));
        assert_eq!(kind.total_items(&json!({ "totalVerbs": 0 })), Some(414));
        assert_eq!(kind.total_items(&json!([1, 2])), None);
        assert_eq!(IndexKind::ArrayLength.total_items(&json!([1, 2, 3])), Some(3));
        assert_eq!(IndexKind::ArrayLength.total_items(&json!({})), None);
    }

    #[tokio::test]
    async fn assembles_level_from_two_chunks() {
        let store = Arc::new(MemoryFetcher::new());
        store.insert("vocabulary/a1/index.json", numbered(0..25));
        store.insert("vocabulary/a1/modules_1.json", numbered(0..20));
        store.insert("vocabulary/a1/modules_2.json", numbered(20..25));
        let loader = loader(&store, true);

        let load = loader
            .load(&ChunkedCollection::vocabulary(Level::A1, 20), Locale::It)
            .await;

        assert_eq!(ids(&load.items), (0..25).collect::<Vec<u64>>());
        assert_eq!(load.chunks_requested, 2);
        assert!(load.is_complete());
        assert_eq!(store.request_count("vocabulary/a1/modules_3.json"), 0);
    }

    #[tokio::test]
    async fn exact_multiple_requests_no_extra_chunk() {
        let store = Arc::new(MemoryFetcher::new());
        store.insert("verbs/stats.json", json!({ "totalVerbs": 100 }));
        store.insert("verbs/verbs_1.json", numbered(0..50));
        store.insert("verbs/verbs_2.json", numbered(50..100));
        let loader = loader(&store, false);

        let load = loader
            .load(&ChunkedCollection::verbs(50, 414), Locale::It)
            .await;

        assert_eq!(load.items.len(), 100);
        assert_eq!(load.chunks_requested, 2);
        assert_eq!(store.request_count("verbs/verbs_3.json"), 0);
    }

    #[tokio::test]
    async fn skips_failed_middle_chunk() {
        let store = Arc::new(MemoryFetcher::new());
        store.insert("verbs/stats.json", json!({ "totalVerbs": 150 }));
        store.insert("verbs/verbs_1.json", numbered(0..50));
        store.fail("verbs/verbs_2.json", 500);
        store.insert("verbs/verbs_3.json", numbered(100..150));
        let loader = loader(&store, true);

        let load = loader
            .load(&ChunkedCollection::verbs(50, 414), Locale::It)
            .await;

        let expected: Vec<u64> = (0..50).chain(100..150).collect();
        assert_eq!(ids(&load.items), expected);
        assert_eq!(load.chunks_loaded, 2);
        assert!(!load.is_complete());
        assert_eq!(
            load.warnings,
            vec![LoadWarning::MissingChunk {
                collection: "verbs".into(),
                chunk: 2,
                resource: ResourcePath::new("verbs/verbs_2.json"),
            }]
        );
    }

    #[tokio::test]
    async fn non_array_chunk_is_skipped() {
        let store = Arc::new(MemoryFetcher::new());
        store.insert("vocabulary/b1/index.json", numbered(0..3));
        store.insert("vocabulary/b1/modules_1.json", json!({ "modules": [] }));
        let loader = loader(&store, true);

        let load = loader
            .load(&ChunkedCollection::vocabulary(Level::B1, 20), Locale::It)
            .await;

        assert!(load.items.is_empty());
        assert!(load.index_found());
        assert_eq!(load.warnings.len(), 1);
    }

    #[tokio::test]
    async fn missing_index_is_empty_not_error() {
        let store = Arc::new(MemoryFetcher::new());
        let loader = loader(&store, true);

        let load = loader
            .load(&ChunkedCollection::verbs(50, 414), Locale::En)
            .await;

        assert!(load.items.is_empty());
        assert!(!load.index_found());
        assert_eq!(load.chunks_requested, 0);
        assert!(matches!(
            load.warnings.as_slice(),
            [LoadWarning::MissingIndex { .. }]
        ));
        assert!(store.requests().iter().all(|p| p.ends_with("stats.json")));
    }

    #[tokio::test]
    async fn oversized_count_is_rejected_without_fetching_chunks() {
        let store = Arc::new(MemoryFetcher::new());
        store.insert(
            "verbs/stats.json",
            json!({ "totalVerbs": 18_000_000_000_000_000_000u64 }),
        );
        let loader = loader(&store, true);

        let load = loader
            .load(&ChunkedCollection::verbs(50, 414), Locale::It)
            .await;

        assert!(load.items.is_empty());
        assert_eq!(load.chunks_requested, 0);
        assert!(matches!(
            load.warnings.as_slice(),
            [LoadWarning::MissingIndex { .. }]
        ));
        assert_eq!(store.requests(), vec!["verbs/stats.json"]);
    }

    #[tokio::test]
    async fn chunk_limit_is_configurable() {
        let store = Arc::new(MemoryFetcher::new());
        store.insert("verbs/stats.json", json!({ "totalVerbs": 120 }));
        let loader = loader(&store, true).with_max_chunks(2);

        let load = loader
            .load(&ChunkedCollection::verbs(50, 414), Locale::It)
            .await;

        assert!(!load.index_found());
        assert_eq!(store.total_requests(), 1);
    }

    #[tokio::test]
    async fn order_is_the_same_sequential_or_concurrent() {
        let store = Arc::new(MemoryFetcher::new().with_latency(std::time::Duration::from_millis(2)));
        store.insert("vocabulary/c1/index.json", numbered(0..45));
        store.insert("vocabulary/c1/modules_1.json", numbered(0..20));
        store.insert("vocabulary/c1/modules_2.json", numbered(20..40));
        store.insert("vocabulary/c1/modules_3.json", numbered(40..45));
        let collection = ChunkedCollection::vocabulary(Level::C1, 20);

        let concurrent = loader(&store, true).load(&collection, Locale::It).await;
        let sequential = loader(&store, false).load(&collection, Locale::It).await;

        assert_eq!(concurrent.items, sequential.items);
        assert_eq!(ids(&concurrent.items), (0..45).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn localized_chunks_mix_with_fallback() {
        let store = Arc::new(MemoryFetcher::new());
        store.insert("vocabulary/a2/index.json", numbered(0..30));
        store.insert("vocabulary/a2/modules_1.json", json!([{ "id": 1, "lang": "it" }]));
        store.insert("vocabulary/a2/modules_2.json", json!([{ "id": 2, "lang": "it" }]));
        store.insert("en/vocabulary/a2/modules_2.json", json!([{ "id": 2, "lang": "en" }]));
        let loader = loader(&store, true);

        let load = loader
            .load(&ChunkedCollection::vocabulary(Level::A2, 20), Locale::En)
            .await;

        let langs: Vec<&str> = load.items.iter().filter_map(|v| v["lang"].as_str()).collect();
        assert_eq!(langs, vec!["it", "en"]);
    }
}
