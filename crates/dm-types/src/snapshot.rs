use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::level::Level;
use crate::locale::Locale;
use crate::resource::ResourcePath;

/// Read-only aggregate of every content type for one locale.
///
/// Built once per load cycle and replaced wholesale on the next one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSnapshot {
    pub locale: Locale,
    pub vocabulary: VocabularyData,
    pub grammar: GrammarData,
    pub verbs: VerbData,
    pub reading: Value,
    pub lessons: Vec<Value>,
    /// Collections that were loaded partially or not at all
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<LoadWarning>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyData {
    pub statistics: Value,
    pub levels: BTreeMap<Level, VocabularyLevel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocabularyLevel {
    pub modules: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarData {
    /// Fields of `grammar/meta.json`, minus `levels` and `statistics`
    #[serde(flatten)]
    pub meta: Map<String, Value>,
    pub levels: BTreeMap<Level, Value>,
    pub statistics: GrammarStatistics,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarStatistics {
    pub total_topics: usize,
    pub total_exercises: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerbData {
    pub statistics: Value,
    pub verbs: Vec<Value>,
}

/// A degraded part of a load cycle. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LoadWarning {
    MissingIndex {
        collection: String,
        resource: ResourcePath,
    },
    MissingChunk {
        collection: String,
        chunk: usize,
        resource: ResourcePath,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::MissingIndex {
                collection,
                resource,
            } => write!(f, "{collection}: index {resource} unavailable"),
            LoadWarning::MissingChunk {
                collection,
                chunk,
                resource,
            } => write!(f, "{collection}: chunk {chunk} ({resource}) skipped"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCounts {
    pub vocabulary_levels: usize,
    pub modules: usize,
    pub verbs: usize,
    pub grammar_levels: usize,
    pub grammar_topics: usize,
    pub grammar_exercises: usize,
    pub lessons: usize,
}

impl ContentSnapshot {
    pub fn counts(&self) -> SnapshotCounts {
        SnapshotCounts {
            vocabulary_levels: self.vocabulary.levels.len(),
            modules: self
                .vocabulary
                .levels
                .values()
                .map(|level| level.modules.len())
                .sum(),
            verbs: self.verbs.verbs.len(),
            grammar_levels: self.grammar.levels.len(),
            grammar_topics: self.grammar.statistics.total_topics,
            grammar_exercises: self.grammar.statistics.total_exercises,
            lessons: self.lessons.len(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn modules(&self, level: Level) -> &[Value] {
        self.vocabulary
            .levels
            .get(&level)
            .map(|l| l.modules.as_slice())
            .unwrap_or_default()
    }
}
