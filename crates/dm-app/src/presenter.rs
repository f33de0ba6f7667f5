use std::io::Write;

use dm_types::{AppEvent, ContentSnapshot, Locale, LoadStatusView};
use kanal::AsyncReceiver;
use tokio_util::sync::CancellationToken;

fn loading_message(locale: Locale) -> &'static str {
    match locale {
        Locale::It => "Caricamento dati...",
        Locale::En => "Loading data...",
        Locale::De => "Daten werden geladen...",
    }
}

fn error_title(locale: Locale) -> &'static str {
    match locale {
        Locale::It => "Errore di caricamento",
        Locale::En => "Loading error",
        Locale::De => "Ladefehler",
    }
}

fn retry_label(locale: Locale) -> &'static str {
    match locale {
        Locale::It => "Riprova",
        Locale::En => "Retry",
        Locale::De => "Erneut versuchen",
    }
}

pub fn render_snapshot(snapshot: &ContentSnapshot) -> String {
    let counts = snapshot.counts();
    let mut out = format!(
        "[{}] {} vocabulary levels, {} modules, {} verbs, {} grammar levels ({} topics, {} exercises), {} lessons",
        snapshot.locale.code(),
        counts.vocabulary_levels,
        counts.modules,
        counts.verbs,
        counts.grammar_levels,
        counts.grammar_topics,
        counts.grammar_exercises,
        counts.lessons,
    );
    for warning in &snapshot.warnings {
        out.push_str(&format!("\n  warning: {warning}"));
    }
    out
}

pub fn render_status(status: &LoadStatusView) -> String {
    let locale = status.locale.map_or("-", |l| l.code());
    let phase = match (&status.error, status.loading) {
        (Some(error), _) => format!("failed: {error}"),
        (None, true) => "loading".to_string(),
        (None, false) => "ready".to_string(),
    };
    let mut out = format!(
        "locale {locale}, {phase}, {} cached resources, {} warnings",
        status.cached_resources, status.warnings
    );
    if let Some(counts) = status.counts {
        out.push_str(&format!(
            ", {} modules, {} verbs, {} lessons",
            counts.modules, counts.verbs, counts.lessons
        ));
    }
    out
}

/// Text shown for an outbound event, `None` for events with nothing to show
pub fn render(event: &AppEvent, json: bool) -> anyhow::Result<Option<String>> {
    let text = match event {
        AppEvent::LoadStarted(locale) => loading_message(*locale).to_string(),
        AppEvent::SnapshotReady(snapshot) if json => serde_json::to_string(snapshot.as_ref())?,
        AppEvent::SnapshotReady(snapshot) => render_snapshot(snapshot),
        AppEvent::LoadFailed { locale, message } => format!(
            "{}: {message}. {} with `retry`.",
            error_title(*locale),
            retry_label(*locale)
        ),
        AppEvent::CacheCleared { entries } => format!("Cleared {entries} cached resources"),
        AppEvent::Status(status) if json => serde_json::to_string(status)?,
        AppEvent::Status(status) => render_status(status),
        _ => return Ok(None),
    };
    Ok(Some(text))
}

/// Writes every outbound event to `out`
pub async fn presenter_loop<W>(
    app_to_view_rx: AsyncReceiver<AppEvent>,
    mut out: W,
    json: bool,
    cancel: CancellationToken,
) -> anyhow::Result<()>
where
    W: Write + Send + 'static,
{
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            event = app_to_view_rx.recv() => event?,
        };

        if let Some(text) = render(&event, json)? {
            writeln!(out, "{text}")?;
            out.flush()?;
        }
    }

    Ok(())
}
