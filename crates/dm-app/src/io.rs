use dm_types::{AppEvent, Level, Locale};
use kanal::AsyncSender;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_util::sync::CancellationToken;

pub const HELP: &str = "commands: locale <it|en|de>, retry, clear, preload <a1..c2>, status, quit";

/// Parse one command line. Blank lines parse to `None`.
pub fn parse_command(line: &str) -> Result<Option<AppEvent>, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };
    let argument = words.next();

    let event = match (command.to_ascii_lowercase().as_str(), argument) {
        ("locale" | "lang", Some(tag)) => {
            AppEvent::Reload(tag.parse::<Locale>().map_err(|e| e.to_string())?)
        }
        ("preload", Some(tag)) => {
            AppEvent::Preload(tag.parse::<Level>().map_err(|e| e.to_string())?)
        }
        ("retry" | "reload", None) => AppEvent::Retry,
        ("clear", None) => AppEvent::ClearCache,
        ("status", None) => AppEvent::StatusRequest,
        ("quit" | "exit", None) => AppEvent::Shutdown,
        ("locale" | "lang" | "preload", None) => {
            return Err(format!("`{command}` needs an argument. {HELP}"));
        }
        _ => return Err(format!("Unknown command `{}`. {HELP}", line.trim())),
    };

    Ok(Some(event))
}

/// Watcher for commands typed on `input`; end of input shuts the app down
pub async fn watcher_io<R>(
    input: R,
    cancel: CancellationToken,
    event_tx: AsyncSender<AppEvent>,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut lines = BufReader::new(input).lines();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            tracing::debug!("Input closed");
            event_tx.send(AppEvent::Shutdown).await?;
            break;
        };

        match parse_command(&line) {
            Ok(Some(event)) => event_tx.send(event).await?,
            Ok(None) => {}
            Err(message) => eprintln!("{message}"),
        }
    }

    Ok(())
}
