use std::sync::Arc;

use dm_core::AssemblyError;
use dm_types::{AppEvent, Locale};
use kanal::AsyncSender;

use crate::state::AppState;

/// Run the load cycle of `generation` and report its outcome.
/// Superseded cycles report nothing.
pub async fn handle_load(
    state: Arc<AppState>,
    locale: Locale,
    generation: u64,
    app_to_view_tx: AsyncSender<AppEvent>,
) {
    if app_to_view_tx.send(AppEvent::LoadStarted(locale)).await.is_err() {
        return;
    }

    let result = state.assembler.reload_with(generation, locale).await;

    if !state.assembler.is_current(generation) {
        tracing::debug!("Load #{} for {} superseded, nothing to report", generation, locale);
        return;
    }

    let event = match result {
        Ok(snapshot) => AppEvent::SnapshotReady(snapshot),
        Err(AssemblyError::Superseded) => return,
        Err(e) => AppEvent::LoadFailed {
            locale,
            message: e.to_string(),
        },
    };

    if let Err(e) = app_to_view_tx.send(event).await {
        tracing::warn!("Failed to publish load result: {}", e);
    }
}
