//! Wire models
//!
//! Rust structs mirroring the JSON records of the notes API.
//! Derived fields (`subtask_count`, `updated_at`, ...) are only ever
//! taken from the server, never computed locally.

use crate::config::UNTITLED;
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Editing mode of a note's content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteType {
    #[default]
    Note,
    Checklist,
}

/// Board column of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteStatus {
    Backlog,
    Todo,
    InProgress,
    Done,
}

impl NoteStatus {
    pub const ALL: [NoteStatus; 4] = [
        NoteStatus::Backlog,
        NoteStatus::Todo,
        NoteStatus::InProgress,
        NoteStatus::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NoteStatus::Backlog => "backlog",
            NoteStatus::Todo => "todo",
            NoteStatus::InProgress => "in_progress",
            NoteStatus::Done => "done",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NoteStatus::Backlog => "Backlog",
            NoteStatus::Todo => "To Do",
            NoteStatus::InProgress => "In Progress",
            NoteStatus::Done => "Done",
        }
    }
}

impl fmt::Display for NoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    fn unit(self) -> &'static str {
        match self {
            Frequency::Daily => "day",
            Frequency::Weekly => "week",
            Frequency::Monthly => "month",
            Frequency::Yearly => "year",
        }
    }
}

fn default_interval() -> u32 {
    1
}

/// Repeat rule attached to a note; completing the note spawns the next occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub freq: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
}

impl RecurrenceRule {
    pub fn new(freq: Frequency, interval: u32) -> Self {
        Self {
            freq,
            interval: interval.max(1),
        }
    }

    /// Human readable form, e.g. "Every day" or "Every 2 weeks"
    pub fn describe(&self) -> String {
        if self.interval <= 1 {
            format!("Every {}", self.freq.unit())
        } else {
            format!("Every {} {}s", self.interval, self.freq.unit())
        }
    }

    /// Next due date after `from`, month and year steps clamp to the last day of the month.
    pub fn advance(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let n = self.interval.max(1);
        match self.freq {
            Frequency::Daily => from.checked_add_signed(Duration::days(i64::from(n))),
            Frequency::Weekly => from.checked_add_signed(Duration::weeks(i64::from(n))),
            Frequency::Monthly => from.checked_add_months(Months::new(n)),
            Frequency::Yearly => from.checked_add_months(Months::new(n.saturating_mul(12))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagBrief {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Which list a note shows up in; flags are independent, trashed wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Trashed,
    Completed,
    Active,
}

/// A note as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub note_type: NoteType,
    pub folder_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub position: f64,
    #[serde(default)]
    pub tags: Vec<TagBrief>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub is_trashed: bool,
    #[serde(default)]
    pub trashed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<NoteStatus>,
    #[serde(default)]
    pub due_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recurrence_rule: Option<RecurrenceRule>,
    #[serde(default)]
    pub is_daily: bool,
    #[serde(default)]
    pub daily_date: Option<String>,
    #[serde(default)]
    pub subtask_count: u32,
    #[serde(default)]
    pub subtask_completed: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn display_title(&self) -> &str {
        display_title(&self.title)
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn has_tag(&self, tag_id: &str) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }

    pub fn visibility(&self) -> Visibility {
        if self.is_trashed {
            Visibility::Trashed
        } else if self.is_completed {
            Visibility::Completed
        } else {
            Visibility::Active
        }
    }

    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at.is_some_and(|due| due < now)
    }
}

/// Title as shown to the user; empty titles read "Untitled".
pub fn display_title(title: &str) -> &str {
    if title.is_empty() {
        UNTITLED
    } else {
        title
    }
}

/// Create note request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoteCreate {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    pub note_type: NoteType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<NoteStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<RecurrenceRule>,
}

impl NoteCreate {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn subtask(parent_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            parent_id: Some(parent_id.into()),
            ..Default::default()
        }
    }
}

/// Partial update of a note.
///
/// `None` leaves a field untouched. For nullable fields `Some(None)` is
/// sent as JSON `null` and clears the value on the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoteUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_at: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_type: Option<NoteType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<Option<RecurrenceRule>>,
}

impl NoteUpdate {
    /// Title and content together, as produced by the editor.
    pub fn text(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Whether the server will capture a version for this update.
    pub fn touches_text(&self) -> bool {
        self.title.is_some() || self.content.is_some()
    }

    /// Apply the patch to a local record (optimistic path).
    pub fn apply_to(&self, note: &mut Note) {
        if let Some(title) = &self.title {
            note.title = title.clone();
        }
        if let Some(content) = &self.content {
            note.content = content.clone();
        }
        if let Some(folder_id) = &self.folder_id {
            note.folder_id = folder_id.clone();
        }
        if let Some(position) = self.position {
            note.position = position;
        }
        if let Some(is_pinned) = self.is_pinned {
            note.is_pinned = is_pinned;
        }
        if let Some(due_at) = self.due_at {
            note.due_at = due_at;
        }
        if let Some(note_type) = self.note_type {
            note.note_type = note_type;
        }
        if let Some(parent_id) = &self.parent_id {
            note.parent_id = parent_id.clone();
        }
        if let Some(rule) = self.recurrence_rule {
            note.recurrence_rule = rule;
        }
    }
}

/// Filters for `GET /notes`.
///
/// With no filters the server returns active top-level notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoteQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_id: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub trashed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<NoteStatus>,
}

impl NoteQuery {
    pub fn trash() -> Self {
        Self {
            trashed: true,
            ..Default::default()
        }
    }

    pub fn completed() -> Self {
        Self {
            completed: Some(true),
            ..Default::default()
        }
    }

    pub fn folder(folder_id: impl Into<String>) -> Self {
        Self {
            folder_id: Some(folder_id.into()),
            ..Default::default()
        }
    }

    pub fn tag(tag_id: impl Into<String>) -> Self {
        Self {
            tag_id: Some(tag_id.into()),
            ..Default::default()
        }
    }
}

/// Body of `PATCH /notes/{id}/status`; `None` serializes as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: Option<NoteStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReorderItem {
    pub id: String,
    pub position: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReorderRequest {
    pub items: Vec<ReorderItem>,
}

/// Version list entry (no content)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteVersionBrief {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

/// Immutable snapshot of a note's title and content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteVersion {
    pub id: String,
    pub note_id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl NoteVersion {
    pub fn brief(&self) -> NoteVersionBrief {
        NoteVersionBrief {
            id: self.id.clone(),
            title: self.title.clone(),
            created_at: self.created_at,
        }
    }
}

/// A note linking to the requested one through `[[title]]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backlink {
    pub id: String,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub note_count: u32,
}

impl Tag {
    pub fn brief(&self) -> TagBrief {
        TagBrief {
            id: self.id.clone(),
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TagCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub note_id: String,
    pub remind_at: DateTime<Utc>,
    pub is_fired: bool,
    pub is_dismissed: bool,
    pub created_at: DateTime<Utc>,
}

/// Unfired reminder joined with the title of its note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingReminder {
    pub id: String,
    pub note_id: String,
    pub note_title: String,
    pub remind_at: DateTime<Utc>,
    pub is_fired: bool,
    pub is_dismissed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub folder_id: Option<String>,
    pub folder_name: Option<String>,
    pub rank: f64,
}

/// File stored against a note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub note_id: String,
    /// Name on the server's disk
    pub filename: String,
    pub original_filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    /// Download path, relative to the server root
    pub url: String,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// File to be uploaded as an attachment
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentUpload {
    pub filename: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// `{"ok": true}` acknowledgement of writes without a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
}
