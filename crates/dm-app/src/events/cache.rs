use std::sync::Arc;

use dm_types::{AppEvent, Level};
use kanal::AsyncSender;

use crate::state::AppState;

pub async fn handle_clear_cache(
    state: Arc<AppState>,
    app_to_view_tx: &AsyncSender<AppEvent>,
) -> anyhow::Result<()> {
    let entries = state.assembler.clear_cache();
    tracing::info!("Cleared {} cached resources", entries);
    app_to_view_tx.send(AppEvent::CacheCleared { entries }).await?;
    Ok(())
}

/// Warm the cache for one level in the active locale
pub async fn handle_preload(state: Arc<AppState>, level: Level) {
    let locale = state.config.read().await.locale;
    let loaded = state.assembler.preload(level, locale).await;
    tracing::info!("Preloaded {} resources for {} ({})", loaded, level, locale);
}
