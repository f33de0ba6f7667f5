use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dm_config::data::DataConfig;
use dm_fetch::Fetcher;
use dm_types::{
    ContentSnapshot, GrammarData, GrammarStatistics, Level, LoadStatusView, LoadWarning, Locale,
    ResourcePath, VerbData, VocabularyData, VocabularyLevel,
};
use futures_util::future::join_all;
use serde_json::{Map, Value, json};
use tokio::sync::watch;

use crate::cache::FetchCache;
use crate::chunked::{ChunkedCollection, ChunkedLoader};
use crate::error::AssemblyError;
use crate::locale::LocaleResolver;
use crate::paths;

/// Observable state of the assembler
#[derive(Debug, Clone, PartialEq)]
pub struct LoadState {
    /// True until the current load cycle completes
    pub loading: bool,
    pub error: Option<String>,
    /// Present only after a successful cycle
    pub snapshot: Option<Arc<ContentSnapshot>>,
    pub locale: Option<Locale>,
    pub generation: u64,
}

impl LoadState {
    fn initial() -> Self {
        Self {
            loading: true,
            error: None,
            snapshot: None,
            locale: None,
            generation: 0,
        }
    }

    pub fn view(&self, cached_resources: usize) -> LoadStatusView {
        LoadStatusView {
            loading: self.loading,
            error: self.error.clone(),
            locale: self.locale,
            counts: self.snapshot.as_ref().map(|s| s.counts()),
            warnings: self.snapshot.as_ref().map_or(0, |s| s.warnings.len()),
            cached_resources,
        }
    }
}

/// Builds a [`ContentSnapshot`] for the active locale out of every content type
pub struct ContentAssembler {
    cache: Arc<FetchCache>,
    resolver: Arc<LocaleResolver>,
    loader: ChunkedLoader,
    data: DataConfig,
    timeout: Option<Duration>,
    generation: AtomicU64,
    state: watch::Sender<LoadState>,
}

impl ContentAssembler {
    pub fn new(fetcher: Arc<dyn Fetcher>, data: DataConfig) -> Self {
        let cache = Arc::new(FetchCache::new(fetcher));
        let resolver = Arc::new(LocaleResolver::new(cache.clone(), data.default_locale));
        let loader = ChunkedLoader::new(resolver.clone(), data.concurrent_chunks)
            .with_max_chunks(data.max_chunks);
        let (state, _) = watch::channel(LoadState::initial());

        Self {
            cache,
            resolver,
            loader,
            data,
            timeout: None,
            generation: AtomicU64::new(0),
            state,
        }
    }

    /// Fail a load cycle that takes longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout.filter(|t| !t.is_zero());
        self
    }

    pub fn cache(&self) -> &Arc<FetchCache> {
        &self.cache
    }

    pub fn resolver(&self) -> &Arc<LocaleResolver> {
        &self.resolver
    }

    pub fn state(&self) -> LoadState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.state.subscribe()
    }

    pub fn status(&self) -> LoadStatusView {
        self.state.borrow().view(self.cache.len())
    }

    /// Assemble a fresh snapshot for `locale` and publish it.
    ///
    /// Each call starts a new generation. When a newer call has started
    /// before this one finishes, the result is discarded and
    /// [`AssemblyError::Superseded`] is returned.
    pub async fn reload(&self, locale: Locale) -> Result<Arc<ContentSnapshot>, AssemblyError> {
        let generation = self.begin(locale);
        self.reload_with(generation, locale).await
    }

    /// Start a new generation for `locale` and mark the state as loading.
    ///
    /// Generations are ordered by calls to `begin`, so callers that spawn
    /// the actual load take their ticket before spawning.
    pub fn begin(&self, locale: Locale) -> u64 {
        let mut generation = 0;
        // bump under the watch lock so state.generation follows the counter
        self.state.send_modify(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.loading = true;
            state.error = None;
            state.snapshot = None;
            state.locale = Some(locale);
            state.generation = generation;
        });
        tracing::info!("Loading content for locale {} (#{})", locale, generation);
        generation
    }

    /// True while no newer generation than `generation` has begun
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Run the load cycle of a generation obtained from [`Self::begin`]
    pub async fn reload_with(
        &self,
        generation: u64,
        locale: Locale,
    ) -> Result<Arc<ContentSnapshot>, AssemblyError> {
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.assemble(locale))
                .await
                .unwrap_or(Err(AssemblyError::Timeout(limit))),
            None => self.assemble(locale).await,
        };

        if !self.is_current(generation) {
            tracing::debug!("Discarding load #{} for {}, superseded", generation, locale);
            return Err(AssemblyError::Superseded);
        }

        match result {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                let counts = snapshot.counts();
                tracing::info!(
                    "Content ready for {}: {} modules, {} verbs, {} grammar topics, {} lessons",
                    locale,
                    counts.modules,
                    counts.verbs,
                    counts.grammar_topics,
                    counts.lessons
                );
                for warning in &snapshot.warnings {
                    tracing::warn!("Degraded content: {}", warning);
                }

                if !self.publish(generation, |state| {
                    state.error = None;
                    state.snapshot = Some(snapshot.clone());
                }) {
                    return Err(AssemblyError::Superseded);
                }
                Ok(snapshot)
            }
            Err(e) => {
                tracing::error!("Content loading failed for {}: {}", locale, e);
                if !self.publish(generation, |state| {
                    state.error = Some(e.to_string());
                    state.snapshot = None;
                }) {
                    return Err(AssemblyError::Superseded);
                }
                Err(e)
            }
        }
    }

    /// Finish `generation` in the published state unless a newer one began
    fn publish(&self, generation: u64, update: impl FnOnce(&mut LoadState)) -> bool {
        self.state.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            state.loading = false;
            update(state);
            true
        })
    }

    /// Re-run the last requested load, or the default locale if none ran yet
    pub async fn retry(&self) -> Result<Arc<ContentSnapshot>, AssemblyError> {
        self.reload(self.retry_locale()).await
    }

    /// Locale a retry loads
    pub fn retry_locale(&self) -> Locale {
        self.state.borrow().locale.unwrap_or(self.data.default_locale)
    }

    /// Drop all cached documents; the next load fetches everything again
    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    /// Warm the cache with `level`'s vocabulary index and grammar.
    /// Returns how many of the two resources are available.
    pub async fn preload(&self, level: Level, locale: Locale) -> usize {
        let index_path = paths::vocabulary_index(level);
        let grammar_path = paths::grammar_level(level);
        let (index, grammar) = tokio::join!(
            self.resolver.resolve_opt(&index_path, locale),
            self.resolver.resolve_opt(&grammar_path, locale),
        );
        let warmed = usize::from(index.is_some()) + usize::from(grammar.is_some());
        tracing::debug!("Preloaded {}/2 resources of {} ({})", warmed, level, locale);
        warmed
    }

    /// Load a single resource for `locale`, with locale fallback
    pub async fn resource(&self, path: &ResourcePath, locale: Locale) -> Option<Arc<Value>> {
        self.resolver.resolve_opt(path, locale).await
    }

    /// Build a snapshot without touching the published state
    pub async fn assemble(&self, locale: Locale) -> Result<ContentSnapshot, AssemblyError> {
        let levels = self.data.levels.clone();
        let vocab_collections: Vec<ChunkedCollection> = levels
            .iter()
            .map(|level| ChunkedCollection::vocabulary(*level, self.data.vocabulary_chunk_size))
            .collect();
        let verb_collection =
            ChunkedCollection::verbs(self.data.verb_chunk_size, self.data.fallback_total_verbs);

        let vocab_stats_path = paths::vocabulary_stats();
        let grammar_meta_path = paths::grammar_meta();
        let grammar_paths: Vec<ResourcePath> =
            levels.iter().map(|level| paths::grammar_level(*level)).collect();
        let verb_stats_path = paths::verb_stats();
        let reading_path = paths::reading();
        let lessons_path = paths::lessons();

        let (vocab_loads, vocab_stats, grammar_meta, grammar_levels, verb_stats, verb_load, reading, lessons) = tokio::join!(
            join_all(
                vocab_collections
                    .iter()
                    .map(|collection| self.loader.load(collection, locale))
            ),
            self.resolver.resolve_opt(&vocab_stats_path, locale),
            self.resolver.resolve_opt(&grammar_meta_path, locale),
            join_all(
                grammar_paths
                    .iter()
                    .map(|path| self.resolver.resolve_opt(path, locale))
            ),
            self.resolver.resolve_opt(&verb_stats_path, locale),
            self.loader.load(&verb_collection, locale),
            self.resolver.resolve_opt(&reading_path, locale),
            self.resolver.resolve_opt(&lessons_path, locale),
        );

        let anything_loaded = vocab_loads.iter().any(|load| load.index_found())
            || vocab_stats.is_some()
            || grammar_meta.is_some()
            || grammar_levels.iter().any(Option::is_some)
            || verb_stats.is_some()
            || reading.is_some()
            || lessons.is_some();
        if !anything_loaded {
            return Err(AssemblyError::NothingLoaded(locale));
        }

        let mut warnings: Vec<LoadWarning> = Vec::new();

        let mut vocab_levels = BTreeMap::new();
        for (level, load) in levels.iter().zip(vocab_loads) {
            warnings.extend(load.warnings.iter().cloned());
            if load.index_found() {
                vocab_levels.insert(
                    *level,
                    VocabularyLevel {
                        modules: load.items,
                    },
                );
            }
        }
        let vocabulary = VocabularyData {
            statistics: owned(vocab_stats)
                .unwrap_or_else(|| json!({ "totalWords": self.data.fallback_total_words })),
            levels: vocab_levels,
        };

        let grammar = assemble_grammar(
            owned(grammar_meta),
            levels
                .iter()
                .copied()
                .zip(grammar_levels.into_iter().map(owned)),
        )?;

        warnings.extend(verb_load.warnings.iter().cloned());
        let verbs = VerbData {
            statistics: owned(verb_stats)
                .unwrap_or_else(|| json!({ "totalVerbs": self.data.fallback_total_verbs })),
            verbs: verb_load.items,
        };

        let reading = owned(reading).unwrap_or_else(|| json!({ "levels": {} }));
        let lessons = match owned(lessons) {
            Some(Value::Array(lessons)) => lessons,
            Some(_) => {
                return Err(AssemblyError::Malformed {
                    resource: paths::lessons(),
                    expected: "an array of lessons",
                });
            }
            None => Vec::new(),
        };

        Ok(ContentSnapshot {
            locale,
            vocabulary,
            grammar,
            verbs,
            reading,
            lessons,
            warnings,
        })
    }
}

fn owned(value: Option<Arc<Value>>) -> Option<Value> {
    value.map(Arc::unwrap_or_clone)
}

/// Merge grammar meta with per-level grammar and count topics and exercises
fn assemble_grammar(
    meta: Option<Value>,
    levels: impl Iterator<Item = (Level, Option<Value>)>,
) -> Result<GrammarData, AssemblyError> {
    let mut meta: Map<String, Value> = match meta {
        Some(Value::Object(meta)) => meta,
        Some(_) => {
            return Err(AssemblyError::Malformed {
                resource: paths::grammar_meta(),
                expected: "an object",
            });
        }
        None => Map::new(),
    };
    meta.remove("levels");
    meta.remove("statistics");

    let mut grammar_levels = BTreeMap::new();
    let mut statistics = GrammarStatistics::default();

    for (level, data) in levels {
        let Some(data) = data else {
            continue;
        };

        if !data.is_object() {
            return Err(AssemblyError::Malformed {
                resource: paths::grammar_level(level),
                expected: "an object",
            });
        }

        match data.get("topics") {
            Some(Value::Array(topics)) => {
                statistics.total_topics += topics.len();
                statistics.total_exercises += topics
                    .iter()
                    .filter_map(|topic| topic.get("exercises").and_then(Value::as_array))
                    .map(Vec::len)
                    .sum::<usize>();
            }
            Some(Value::Null) | None => {}
            Some(_) => {
                return Err(AssemblyError::Malformed {
                    resource: paths::grammar_level(level),
                    expected: "a topics array",
                });
            }
        }

        grammar_levels.insert(level, data);
    }

    Ok(GrammarData {
        meta,
        levels: grammar_levels,
        statistics,
    })
}
