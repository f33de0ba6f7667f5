use std::time::Duration;

use dm_types::{Locale, ResourcePath};

/// Failure of a whole load cycle. Per-resource failures never end up here.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssemblyError {
    #[error("{resource} is malformed: expected {expected}")]
    Malformed {
        resource: ResourcePath,
        expected: &'static str,
    },

    #[error("No content could be loaded for locale {0}")]
    NothingLoaded(Locale),

    #[error("Content loading timed out after {0:?}")]
    Timeout(Duration),

    #[error("Superseded by a newer load")]
    Superseded,
}
