//! Autosave debounce
//!
//! A single-slot buffer holding the latest unsaved `{note_id, title,
//! content}` snapshot. Each edit overwrites the slot and pushes the
//! deadline back; the slot is emptied when its contents are handed out
//! for persisting, either because the deadline passed (`tick`) or because
//! the caller forces it (`flush`).
//!
//! The scheduler never performs I/O and never reads a clock itself; the
//! caller passes `now` in.

use std::time::{Duration, Instant};

/// Full snapshot of the editor fields for one note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub note_id: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Idle,
    Pending { edit: PendingEdit, deadline: Instant },
}

#[derive(Debug)]
pub struct AutosaveScheduler {
    delay: Duration,
    state: State,
}

impl AutosaveScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: State::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending snapshot and restart the quiet period.
    ///
    /// An edit for a different note than the one pending replaces it; the
    /// caller flushes before switching notes so this does not drop data.
    pub fn edit(&mut self, edit: PendingEdit, now: Instant) {
        if let State::Pending { edit: previous, .. } = &self.state {
            if previous.note_id != edit.note_id {
                tracing::warn!(
                    "Pending edit for {} replaced by edit for {} without a flush",
                    previous.note_id,
                    edit.note_id
                );
            }
        }
        self.state = State::Pending {
            edit,
            deadline: now + self.delay,
        };
    }

    /// Take the pending edit if its deadline has passed.
    pub fn tick(&mut self, now: Instant) -> Option<PendingEdit> {
        match &self.state {
            State::Pending { deadline, .. } if now >= *deadline => self.take(),
            _ => None,
        }
    }

    /// Take the pending edit regardless of the deadline. Idle stays idle.
    pub fn flush(&mut self) -> Option<PendingEdit> {
        self.take()
    }

    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            State::Pending { deadline, .. } => Some(*deadline),
            State::Idle => None,
        }
    }

    pub fn pending(&self) -> Option<&PendingEdit> {
        match &self.state {
            State::Pending { edit, .. } => Some(edit),
            State::Idle => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }

    fn take(&mut self) -> Option<PendingEdit> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Pending { edit, .. } => Some(edit),
            State::Idle => None,
        }
    }
}
