use std::sync::Arc;

use dm_types::{AppEvent, Locale};
use kanal::{AsyncReceiver, AsyncSender};
use tokio_util::sync::CancellationToken;

use crate::state::AppState;

pub mod cache;
pub mod reload;

use cache::{handle_clear_cache, handle_preload};
use reload::handle_load;

/// App's main loop
pub async fn event_loop(
    state: Arc<AppState>,
    view_to_app_rx: AsyncReceiver<AppEvent>,
    app_to_view_tx: AsyncSender<AppEvent>,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    tracing::info!("[EVENT_LOOP] Waiting for commands");
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = view_to_app_rx.recv() => event?,
        };

        tracing::debug!("[EVENT_LOOP] {:?}", std::mem::discriminant(&event));
        if matches!(event, AppEvent::Shutdown) {
            tracing::info!("[EVENT_LOOP] Shutdown requested");
            cancel.cancel();
            break;
        }

        handle_events(state.clone(), &app_to_view_tx, event).await?;
    }

    Ok(())
}

async fn handle_events(
    state: Arc<AppState>,
    app_to_view_tx: &AsyncSender<AppEvent>,
    event: AppEvent,
) -> anyhow::Result<()> {
    match event {
        AppEvent::Reload(locale) => {
            state.config.write().await.locale = locale;
            spawn_load(state, locale, app_to_view_tx);
        }
        AppEvent::Retry => {
            let locale = state.assembler.retry_locale();
            spawn_load(state, locale, app_to_view_tx);
        }
        AppEvent::ClearCache => {
            handle_clear_cache(state, app_to_view_tx).await?;
        }
        AppEvent::Preload(level) => {
            tokio::spawn(handle_preload(state, level));
        }
        AppEvent::StatusRequest => {
            let status = state.assembler.status();
            app_to_view_tx.send(AppEvent::Status(status)).await?;
        }
        AppEvent::Shutdown => {}
        AppEvent::LoadStarted(_)
        | AppEvent::SnapshotReady(_)
        | AppEvent::LoadFailed { .. }
        | AppEvent::CacheCleared { .. }
        | AppEvent::Status(_) => {
            // view-only events, ignore in backend
        }
    }

    Ok(())
}

/// Take the generation ticket in command order, then load detached so a
/// newer command can supersede this one
fn spawn_load(state: Arc<AppState>, locale: Locale, app_to_view_tx: &AsyncSender<AppEvent>) {
    let generation = state.assembler.begin(locale);
    tokio::spawn(handle_load(
        state,
        locale,
        generation,
        app_to_view_tx.clone(),
    ));
}
