use std::sync::Arc;

use dm_types::AppEvent;
use kanal::{AsyncReceiver, AsyncSender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::events::event_loop;
use crate::io::watcher_io;
use crate::presenter::presenter_loop;
use crate::state::AppState;

/// Centralized channel management
pub struct ChannelSet {
    pub app_to_view: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
    pub view_to_app: (AsyncSender<AppEvent>, AsyncReceiver<AppEvent>),
}

impl ChannelSet {
    pub fn new(command_queue: usize) -> Self {
        Self {
            app_to_view: kanal::bounded_async(256),
            view_to_app: kanal::bounded_async(command_queue.max(1)),
        }
    }
}

/// Application controller for task spawning and lifecycle
pub struct AppController {
    channels: ChannelSet,
    state: Arc<AppState>,
    cancel_token: CancellationToken,
}

impl AppController {
    pub fn new(state: Arc<AppState>, command_queue: usize) -> Self {
        Self {
            channels: ChannelSet::new(command_queue),
            state,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Sender for commands into the event loop
    pub fn commands(&self) -> AsyncSender<AppEvent> {
        self.channels.view_to_app.0.clone()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn spawn_tasks(&self, json: bool, read_stdin: bool) -> JoinSet<anyhow::Result<()>> {
        let mut tasks = JoinSet::new();

        // Event loop
        tasks.spawn(event_loop(
            self.state.clone(),
            self.channels.view_to_app.1.clone(),
            self.channels.app_to_view.0.clone(),
            self.cancel_token.child_token(),
        ));

        // Presenter
        tasks.spawn(presenter_loop(
            self.channels.app_to_view.1.clone(),
            std::io::stdout(),
            json,
            self.cancel_token.child_token(),
        ));

        // Stdin commands
        if read_stdin {
            tasks.spawn(watcher_io(
                tokio::io::stdin(),
                self.cancel_token.child_token(),
                self.channels.view_to_app.0.clone(),
            ));
        }

        tasks
    }

    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}
