use std::sync::Arc;

use serde::Serialize;

use crate::level::Level;
use crate::locale::Locale;
use crate::snapshot::{ContentSnapshot, SnapshotCounts};

#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Switch the active locale and assemble a fresh snapshot
    Reload(Locale),
    /// Re-run the last assembly after a failure
    Retry,
    ClearCache,
    Preload(Level),
    StatusRequest,
    LoadStarted(Locale),
    SnapshotReady(Arc<ContentSnapshot>),
    LoadFailed {
        locale: Locale,
        message: String,
    },
    CacheCleared {
        entries: usize,
    },
    Status(LoadStatusView),
    Shutdown,
}

/// What the presentation layer needs to know about the current load state
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStatusView {
    pub loading: bool,
    pub error: Option<String>,
    pub locale: Option<Locale>,
    pub counts: Option<SnapshotCounts>,
    pub warnings: usize,
    pub cached_resources: usize,
}
