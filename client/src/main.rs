// Every Note - headless client
// Boots the core, syncs once and drains background work

use anyhow::Context;
use everynote::api::NoteQuery;
use everynote::app;
use everynote::config::DATA_DIR_ENV;
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    app::init_tracing();

    tracing::info!("Starting Every Note client");

    let data_dir = std::env::var_os(DATA_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".everynote"));

    let state = app::setup(&data_dir)
        .await
        .context("Failed to initialize application")?;

    state
        .notes
        .refresh(NoteQuery::default())
        .await
        .with_context(|| format!("Failed to fetch notes from {}", state.settings.api_base_url))?;

    let notes = state.notes.notes();
    let pinned = notes.iter().filter(|n| n.is_pinned).count();
    let past_due = notes.iter().filter(|n| n.is_past_due(state.clock.wall())).count();
    tracing::info!(
        "{} note(s): {} pinned, {} past due",
        notes.len(),
        pinned,
        past_due
    );

    match state.tags.refresh().await {
        Ok(tags) => tracing::info!("{} tag(s)", tags.len()),
        Err(e) => tracing::warn!("Failed to load tags: {}", e),
    }

    match state.reminders.check_and_trigger().await {
        Ok(fired) => {
            for event in fired {
                tracing::info!("Reminder: {}", event.note_title);
            }
        }
        Err(e) => tracing::warn!("Failed to check reminders: {}", e),
    }

    state.shutdown().await;
    Ok(())
}
