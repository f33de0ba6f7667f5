use dm_types::{Level, Locale};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, env_parse};

fn default_base() -> String {
    "public/data".to_string()
}

fn default_levels() -> Vec<Level> {
    Level::ALL.to_vec()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Root of the JSON store: an http(s) URL or a local directory
    #[serde(default = "default_base")]
    pub base: String,
    /// Locale whose content always exists and serves as fallback
    pub default_locale: Locale,
    /// Modules per `vocabulary/{level}/modules_{n}.json`
    pub vocabulary_chunk_size: usize,
    /// Verbs per `verbs/verbs_{n}.json`
    pub verb_chunk_size: usize,
    /// Verb count used when `verbs/stats.json` has no `totalVerbs`
    pub fallback_total_verbs: usize,
    /// Reported word count when `vocabulary/stats.json` is absent
    pub fallback_total_words: usize,
    #[serde(default = "default_levels")]
    pub levels: Vec<Level>,
    /// Fetch chunks of a collection concurrently instead of one by one
    #[serde(default = "default_true")]
    pub concurrent_chunks: bool,
    /// Upper bound on chunk files per collection; larger indexes are rejected
    pub max_chunks: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            default_locale: Locale::It,
            vocabulary_chunk_size: 20,
            verb_chunk_size: 50,
            fallback_total_verbs: 414,
            fallback_total_words: 14315,
            levels: default_levels(),
            concurrent_chunks: default_true(),
            max_chunks: 1_000,
        }
    }
}

impl DataConfig {
    pub(crate) fn apply_env(&mut self) {
        if let Ok(base) = std::env::var("DM_DATA_BASE") {
            self.base = base;
        }
        if let Some(locale) = env_parse::<Locale>("DM_DEFAULT_LOCALE") {
            self.default_locale = locale;
        }
        if let Some(concurrent) = env_parse::<bool>("DM_CONCURRENT_CHUNKS") {
            self.concurrent_chunks = concurrent;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = [
            ("data.vocabulary_chunk_size", self.vocabulary_chunk_size),
            ("data.verb_chunk_size", self.verb_chunk_size),
            ("data.max_chunks", self.max_chunks),
        ];
        match sizes.into_iter().find(|(_, size)| *size == 0) {
            Some((field, _)) => Err(ConfigError::Zero(field)),
            None => Ok(()),
        }
    }
}
