use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dm_types::AppEvent;
use tokio::signal;

mod cli;
mod controller;
mod events;
mod io;
mod logging;
mod presenter;
mod profile;
mod state;


use self::cli::Cli;
use self::controller::AppController;
use self::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let (config, source) = profile::load_config(&cli)?;
    logging::init_tracing(&config.log)?;

    if let Some(path) = source {
        tracing::info!("Loaded config from {}", path.display());
    }

    tracing::info!("Content root: {}", config.data.base);
    let state = Arc::new(AppState::new(config)?);

    if cli.once {
        return run_once(state, cli.json).await;
    }

    // Shutdown future (Ctrl+C)
    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl+c: {e}");
            std::future::pending::<()>().await;
        }
    };

    run(state, cli.json, shutdown).await?;
    // a pending stdin read would keep the runtime from shutting down
    std::process::exit(0)
}

/// Assemble one snapshot for the configured locale and print it
async fn run_once(state: Arc<AppState>, json: bool) -> anyhow::Result<()> {
    let locale = state.config.read().await.locale;
    let snapshot = state
        .assembler
        .reload(locale)
        .await
        .with_context(|| format!("Loading content for {locale} failed"))?;

    if let Some(text) = presenter::render(&AppEvent::SnapshotReady(snapshot), json)? {
        println!("{text}");
    }
    Ok(())
}

pub async fn run(
    state: Arc<AppState>,
    json: bool,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    let (locale, command_queue) = {
        let config = state.config.read().await;
        (config.locale, config.command_queue)
    };

    let controller = AppController::new(state, command_queue);
    let cancel = controller.cancel_token();
    let mut tasks = controller.spawn_tasks(json, true);

    eprintln!("{}", io::HELP);
    controller.commands().send(AppEvent::Reload(locale)).await?;

    tokio::select! {
        _ = shutdown => {
            tracing::info!("Shutdown requested");
        }
        _ = cancel.cancelled() => {
            tracing::info!("Shutting down");
        }
        Some(result) = tasks.join_next() => {
            match result {
                Ok(Ok(())) => tracing::warn!("task exited"),
                Ok(Err(e)) => tracing::error!("task failed: {e}"),
                Err(e) => tracing::error!("task panicked: {e}"),
            }
        }
    }

    controller.shutdown();
    tasks.abort_all();
    Ok(())
}
