//! Reminders service
//!
//! Polls the server for pending reminders and fires the ones that are due.
//! Fired reminders stay in a local list until dismissed or snoozed, and a
//! `ReminderEvent` is broadcast for each one.

use crate::api::{display_title, NotesBackend, PendingReminder, Reminder};
use crate::config::DEFAULT_SNOOZE_MINUTES;
use crate::error::Result;
use crate::services::clock::Clock;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReminderEvent {
    pub reminder_id: String,
    pub note_id: String,
    pub note_title: String,
}

#[derive(Default)]
struct ReminderLists {
    pending: Vec<PendingReminder>,
    /// Newest first.
    fired: Vec<PendingReminder>,
}

/// Reminders service with background scheduler
pub struct RemindersService {
    backend: Arc<dyn NotesBackend>,
    clock: Arc<dyn Clock>,
    lists: RwLock<ReminderLists>,
    events: broadcast::Sender<ReminderEvent>,
}

impl RemindersService {
    pub fn new(backend: Arc<dyn NotesBackend>, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            clock,
            lists: RwLock::new(ReminderLists::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReminderEvent> {
        self.events.subscribe()
    }

    pub fn pending(&self) -> Vec<PendingReminder> {
        self.lists
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
            .clone()
    }

    pub fn fired(&self) -> Vec<PendingReminder> {
        self.lists
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .fired
            .clone()
    }

    /// Badge count: pending plus fired.
    pub fn badge_count(&self) -> usize {
        let lists = self.lists.read().unwrap_or_else(PoisonError::into_inner);
        lists.pending.len() + lists.fired.len()
    }

    /// Create a new reminder
    pub async fn create_reminder(
        &self,
        note_id: &str,
        remind_at: DateTime<Utc>,
    ) -> Result<Reminder> {
        tracing::info!("Creating reminder for note {} at {}", note_id, remind_at);
        let reminder = self.backend.create_reminder(note_id, remind_at).await?;
        self.poll().await?;
        Ok(reminder)
    }

    /// Replace the pending list with the server's.
    pub async fn poll(&self) -> Result<Vec<PendingReminder>> {
        let pending = self.backend.pending_reminders().await?;
        tracing::debug!("{} pending reminder(s)", pending.len());
        self.lists
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .pending = pending.clone();
        Ok(pending)
    }

    /// Fire every pending reminder whose time has come.
    pub async fn fire_due(&self) -> Vec<ReminderEvent> {
        let now = self.clock.wall();
        let due: Vec<PendingReminder> = {
            let mut lists = self.lists.write().unwrap_or_else(PoisonError::into_inner);
            let (due, rest) = std::mem::take(&mut lists.pending)
                .into_iter()
                .partition(|r| r.remind_at <= now);
            lists.pending = rest;
            due
        };

        let mut events = Vec::with_capacity(due.len());
        for reminder in due {
            tracing::info!(
                "Triggering reminder {} for note {}",
                reminder.id,
                reminder.note_id
            );

            // Shown even when marking fails; the next poll brings it back.
            if let Err(e) = self.backend.fire_reminder(&reminder.id).await {
                tracing::warn!("Failed to mark reminder {} fired: {}", reminder.id, e);
            }

            let event = ReminderEvent {
                reminder_id: reminder.id.clone(),
                note_id: reminder.note_id.clone(),
                note_title: display_title(&reminder.note_title).to_string(),
            };
            if self.events.send(event.clone()).is_err() {
                tracing::debug!("No listeners for reminder {}", reminder.id);
            }

            let mut lists = self.lists.write().unwrap_or_else(PoisonError::into_inner);
            if !lists.fired.iter().any(|f| f.id == reminder.id) {
                lists.fired.insert(0, reminder);
            }
            events.push(event);
        }
        events
    }

    /// One scheduler tick: poll, then fire what is due.
    pub async fn check_and_trigger(&self) -> Result<Vec<ReminderEvent>> {
        self.poll().await?;
        Ok(self.fire_due().await)
    }

    pub async fn dismiss(&self, id: &str) -> Result<()> {
        self.backend.dismiss_reminder(id).await?;
        let mut lists = self.lists.write().unwrap_or_else(PoisonError::into_inner);
        lists.fired.retain(|r| r.id != id);
        lists.pending.retain(|r| r.id != id);
        Ok(())
    }

    /// Push a reminder back, by 15 minutes unless told otherwise.
    pub async fn snooze(&self, id: &str, minutes: Option<u32>) -> Result<Reminder> {
        let minutes = minutes.unwrap_or(DEFAULT_SNOOZE_MINUTES);
        tracing::info!("Snoozing reminder {} for {} min", id, minutes);
        let reminder = self.backend.snooze_reminder(id, minutes).await?;
        self.lists
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .fired
            .retain(|r| r.id != id);
        self.poll().await?;
        Ok(reminder)
    }

    /// Start the background scheduler
    pub fn start_scheduler(
        self: Arc<Self>,
        every: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Starting reminders scheduler ({:?})", every);

            let mut interval = tokio::time::interval(every);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        if let Err(e) = self.check_and_trigger().await {
                            tracing::warn!("Error checking reminders, retrying next tick: {}", e);
                        }
                    }
                }
            }

            tracing::info!("Reminders scheduler stopped");
        })
    }
}
