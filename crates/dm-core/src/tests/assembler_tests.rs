use std::sync::Arc;
use std::time::Duration;

use dm_config::data::DataConfig;
use dm_fetch::MemoryFetcher;
use dm_types::{Level, LoadWarning, Locale};
use serde_json::json;

use super::fixtures::{assembler, numbered, populated_store};
use crate::assembler::ContentAssembler;
use crate::error::AssemblyError;
use crate::paths;

#[tokio::test]
async fn assembles_every_content_type() {
    let store = Arc::new(populated_store());
    let assembler = assembler(&store);

    let snapshot = assembler.reload(Locale::It).await.unwrap();

    assert_eq!(snapshot.locale, Locale::It);
    assert_eq!(snapshot.modules(Level::A1).len(), 25);
    assert_eq!(snapshot.modules(Level::B1).len(), 3);
    assert!(!snapshot.vocabulary.levels.contains_key(&Level::C2));
    assert_eq!(snapshot.vocabulary.statistics, json!({ "totalWords": 45 }));

    assert_eq!(snapshot.grammar.statistics.total_topics, 3);
    assert_eq!(snapshot.grammar.statistics.total_exercises, 3);
    assert_eq!(snapshot.grammar.meta["title"], "Grammatica");
    assert!(!snapshot.grammar.meta.contains_key("levels"));
    assert_eq!(snapshot.grammar.levels.len(), 2);

    assert_eq!(snapshot.verbs.verbs.len(), 120);
    assert_eq!(snapshot.verbs.verbs[119]["id"], "verb-119");
    assert_eq!(snapshot.lessons.len(), 2);
    assert_eq!(snapshot.reading["levels"]["A1"][0]["title"], "Im Park");
}

#[tokio::test]
async fn levels_without_index_are_reported() {
    let store = Arc::new(populated_store());
    let snapshot = assembler(&store).reload(Locale::It).await.unwrap();

    let missing: Vec<String> = snapshot
        .warnings
        .iter()
        .filter_map(|w| match w {
            LoadWarning::MissingIndex { collection, .. } => Some(collection.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(
        missing,
        vec![
            "vocabulary/a2",
            "vocabulary/b2",
            "vocabulary/c1",
            "vocabulary/c2"
        ]
    );
    assert!(snapshot.is_degraded());
}

#[tokio::test]
async fn state_moves_from_loading_to_ready() {
    let store = Arc::new(populated_store());
    let assembler = assembler(&store);

    let before = assembler.state();
    assert!(before.loading);
    assert!(before.snapshot.is_none());

    assembler.reload(Locale::It).await.unwrap();

    let after = assembler.state();
    assert!(!after.loading);
    assert!(after.error.is_none());
    assert_eq!(after.locale, Some(Locale::It));
    assert_eq!(after.snapshot.map(|s| s.verbs.verbs.len()), Some(120));
}

#[tokio::test]
async fn failed_chunk_leaves_partial_collection() {
    let store = Arc::new(populated_store());
    store.fail("verbs/verbs_2.json", 500);
    let assembler = assembler(&store);

    let snapshot = assembler.reload(Locale::It).await.unwrap();

    assert_eq!(snapshot.verbs.verbs.len(), 70);
    assert_eq!(snapshot.verbs.verbs[50]["id"], "verb-100");
    assert!(!assembler.state().loading);
    assert!(snapshot.warnings.contains(&LoadWarning::MissingChunk {
        collection: "verbs".into(),
        chunk: 2,
        resource: "verbs/verbs_2.json".into(),
    }));
}

#[tokio::test]
async fn non_default_locale_falls_back_per_resource() {
    let store = Arc::new(populated_store());
    let assembler = assembler(&store);

    let english = assembler.reload(Locale::En).await.unwrap();
    let italian = assembler.reload(Locale::It).await.unwrap();

    assert_eq!(english.locale, Locale::En);
    assert_eq!(english.lessons, vec![json!({ "id": 1, "lang": "en" })]);
    assert_eq!(english.vocabulary, italian.vocabulary);
    assert_eq!(english.verbs, italian.verbs);
    assert!(english.warnings.iter().all(|w| matches!(w, LoadWarning::MissingIndex { .. })));
}

#[tokio::test]
async fn repeated_load_fetches_nothing_new() {
    let store = Arc::new(populated_store());
    let assembler = assembler(&store);

    assembler.reload(Locale::It).await.unwrap();
    let fetched = store.total_requests();
    let cached = assembler.cache().len();
    assembler.reload(Locale::It).await.unwrap();

    assert_eq!(assembler.cache().len(), cached);
    // absent vocabulary indexes and grammar levels are asked for again
    assert_eq!(store.total_requests() - fetched, 8);
}

#[tokio::test]
async fn clear_cache_refetches_everything() {
    let store = Arc::new(populated_store());
    let assembler = assembler(&store);

    assembler.reload(Locale::It).await.unwrap();
    assert!(assembler.clear_cache() > 0);
    assert!(assembler.cache().is_empty());
    assembler.reload(Locale::It).await.unwrap();

    assert_eq!(store.request_count("verbs/verbs_1.json"), 2);
}

#[tokio::test]
async fn missing_resources_get_defaults() {
    let store = Arc::new(MemoryFetcher::new());
    store.insert("vocabulary/a1/index.json", numbered("a1", 0..1));
    store.insert("vocabulary/a1/modules_1.json", numbered("a1", 0..1));
    let assembler = assembler(&store);

    let snapshot = assembler.reload(Locale::De).await.unwrap();

    assert_eq!(snapshot.vocabulary.statistics, json!({ "totalWords": 14315 }));
    assert_eq!(snapshot.verbs.statistics, json!({ "totalVerbs": 414 }));
    assert!(snapshot.verbs.verbs.is_empty());
    assert_eq!(snapshot.reading, json!({ "levels": {} }));
    assert!(snapshot.lessons.is_empty());
    assert!(snapshot.grammar.levels.is_empty());
    assert_eq!(snapshot.grammar.statistics.total_topics, 0);
}

#[tokio::test]
async fn verb_stats_without_count_use_fallback() {
    let store = Arc::new(MemoryFetcher::new());
    store.insert("verbs/stats.json", json!({ "updated": "2024-01-01" }));
    for n in 1..=9 {
        store.insert(format!("verbs/verbs_{n}.json"), json!([{ "chunk": n }]));
    }
    let assembler = assembler(&store);

    let snapshot = assembler.reload(Locale::It).await.unwrap();

    assert_eq!(snapshot.verbs.verbs.len(), 9);
    assert_eq!(store.request_count("verbs/verbs_10.json"), 0);
}

#[tokio::test]
async fn empty_store_is_a_hard_error() {
    let store = Arc::new(MemoryFetcher::new());
    let assembler = assembler(&store);

    let err = assembler.reload(Locale::En).await.unwrap_err();

    assert_eq!(err, AssemblyError::NothingLoaded(Locale::En));
    let state = assembler.state();
    assert!(!state.loading);
    assert!(state.snapshot.is_none());
    assert!(state.error.unwrap().contains("No content"));
}

#[tokio::test]
async fn retry_reuses_last_locale() {
    let store = Arc::new(MemoryFetcher::new());
    let assembler = assembler(&store);

    assert!(assembler.reload(Locale::De).await.is_err());
    store.insert("lessons.json", json!([{ "id": 7 }]));

    let snapshot = assembler.retry().await.unwrap();

    assert_eq!(snapshot.locale, Locale::De);
    assert_eq!(snapshot.lessons.len(), 1);
    assert!(assembler.state().error.is_none());
}

#[tokio::test]
async fn malformed_lessons_fail_the_load() {
    let store = Arc::new(populated_store());
    store.insert("lessons.json", json!({ "not": "a list" }));
    let assembler = assembler(&store);

    let err = assembler.reload(Locale::It).await.unwrap_err();

    assert!(matches!(err, AssemblyError::Malformed { .. }));
    assert!(assembler.state().error.is_some());
}

#[tokio::test]
async fn malformed_grammar_topics_fail_the_load() {
    let store = Arc::new(populated_store());
    store.insert("grammar/b1.json", json!({ "topics": { "title": "oops" } }));
    let assembler = assembler(&store);

    let err = assembler.reload(Locale::It).await.unwrap_err();

    assert_eq!(
        err,
        AssemblyError::Malformed {
            resource: "grammar/b1.json".into(),
            expected: "a topics array",
        }
    );
}

#[tokio::test]
async fn slow_store_times_out() {
    let store = Arc::new(populated_store().with_latency(Duration::from_millis(200)));
    let assembler = ContentAssembler::new(store.clone(), DataConfig::default())
        .with_timeout(Some(Duration::from_millis(20)));

    let err = assembler.reload(Locale::It).await.unwrap_err();

    assert_eq!(err, AssemblyError::Timeout(Duration::from_millis(20)));
    let state = assembler.state();
    assert!(!state.loading);
    assert!(state.error.is_some());
}

#[tokio::test]
async fn newer_reload_wins() {
    let store = Arc::new(populated_store().with_latency(Duration::from_millis(20)));
    let assembler = assembler(&store);

    let (first, second) = tokio::join!(assembler.reload(Locale::It), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        assembler.reload(Locale::En).await
    });

    assert_eq!(first.unwrap_err(), AssemblyError::Superseded);
    assert_eq!(second.unwrap().locale, Locale::En);

    let state = assembler.state();
    assert_eq!(state.locale, Some(Locale::En));
    assert_eq!(state.generation, 2);
    assert_eq!(state.snapshot.map(|s| s.locale), Some(Locale::En));
}

#[tokio::test]
async fn subscribers_see_completed_load() {
    let store = Arc::new(populated_store());
    let assembler = assembler(&store);
    let mut rx = assembler.subscribe();

    assembler.reload(Locale::It).await.unwrap();

    rx.changed().await.unwrap();
    let state = rx.borrow_and_update().clone();
    assert!(!state.loading);
    assert!(state.snapshot.is_some());
}

#[tokio::test]
async fn preload_warms_level_resources() {
    let store = Arc::new(populated_store());
    let assembler = assembler(&store);

    assert_eq!(assembler.preload(Level::A1, Locale::It).await, 2);
    assert_eq!(assembler.preload(Level::C2, Locale::It).await, 0);

    assert!(assembler.cache().contains("vocabulary/a1/index.json"));
    assert!(assembler.cache().contains("grammar/a1.json"));

    assembler.reload(Locale::It).await.unwrap();
    assert_eq!(store.request_count("grammar/a1.json"), 1);
}

#[tokio::test]
async fn status_view_reports_counts() {
    let store = Arc::new(populated_store());
    let assembler = assembler(&store);

    assembler.reload(Locale::It).await.unwrap();
    let status = assembler.status();

    assert!(!status.loading);
    assert_eq!(status.counts.map(|c| c.modules), Some(28));
    assert_eq!(status.warnings, 4);
    assert_eq!(status.cached_resources, assembler.cache().len());
}

#[tokio::test]
async fn generation_order_follows_begin_not_completion() {
    let store = Arc::new(populated_store().with_latency(Duration::from_millis(10)));
    let assembler = assembler(&store);

    let older = assembler.begin(Locale::It);
    let newer = assembler.begin(Locale::En);
    assert!(!assembler.is_current(older));

    // the newer ticket finishes first, the older one must not overwrite it
    let en = assembler.reload_with(newer, Locale::En).await.unwrap();
    let it = assembler.reload_with(older, Locale::It).await;

    assert_eq!(en.locale, Locale::En);
    assert_eq!(it.unwrap_err(), AssemblyError::Superseded);
    let state = assembler.state();
    assert_eq!(state.locale, Some(Locale::En));
    assert_eq!(state.snapshot.map(|s| s.locale), Some(Locale::En));
}

#[tokio::test]
async fn oversized_verb_count_degrades_instead_of_failing() {
    let store = Arc::new(populated_store());
    store.insert(
        "verbs/stats.json",
        json!({ "totalVerbs": 18_000_000_000_000_000_000u64 }),
    );
    let assembler = assembler(&store);

    let snapshot = assembler.reload(Locale::It).await.unwrap();

    assert!(snapshot.verbs.verbs.is_empty());
    assert!(snapshot.warnings.contains(&LoadWarning::MissingIndex {
        collection: "verbs".into(),
        resource: "verbs/stats.json".into(),
    }));
    assert_eq!(store.request_count("verbs/verbs_1.json"), 0);
}

#[tokio::test]
async fn single_resource_uses_locale_fallback() {
    let store = Arc::new(populated_store());
    let assembler = assembler(&store);

    let lessons = assembler
        .resource(&paths::lessons(), Locale::En)
        .await
        .unwrap();
    let reading = assembler.resource(&paths::reading(), Locale::De).await.unwrap();
    let missing = assembler
        .resource(&paths::grammar_level(Level::C2), Locale::It)
        .await;

    assert_eq!(*lessons, json!([{ "id": 1, "lang": "en" }]));
    assert_eq!(reading["levels"]["A1"][0]["title"], "Im Park");
    assert!(missing.is_none());
    assert!(!assembler.cache().contains("de/reading.json"));
}
