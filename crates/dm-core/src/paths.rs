//! Catalogue of the resources in the content tree.

use dm_types::{Level, ResourcePath};

pub fn vocabulary_stats() -> ResourcePath {
    ResourcePath::new("vocabulary/stats.json")
}

/// Array with one entry per module of `level`
pub fn vocabulary_index(level: Level) -> ResourcePath {
    ResourcePath::new(format!("vocabulary/{}/index.json", level.dir_name()))
}

/// 1-based chunk of `level`'s modules
pub fn vocabulary_modules(level: Level, chunk: usize) -> ResourcePath {
    ResourcePath::new(format!(
        "vocabulary/{}/modules_{}.json",
        level.dir_name(),
        chunk
    ))
}

pub fn grammar_meta() -> ResourcePath {
    ResourcePath::new("grammar/meta.json")
}

pub fn grammar_level(level: Level) -> ResourcePath {
    ResourcePath::new(format!("grammar/{}.json", level.dir_name()))
}

pub fn verb_stats() -> ResourcePath {
    ResourcePath::new("verbs/stats.json")
}

pub fn verb_index() -> ResourcePath {
    ResourcePath::new("verbs/index.json")
}

/// 1-based chunk of the verb list
pub fn verb_chunk(chunk: usize) -> ResourcePath {
    ResourcePath::new(format!("verbs/verbs_{chunk}.json"))
}

pub fn reading() -> ResourcePath {
    ResourcePath::new("reading.json")
}

pub fn lessons() -> ResourcePath {
    ResourcePath::new("lessons.json")
}
