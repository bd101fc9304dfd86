//! Notes API
//!
//! `NotesBackend` is the only seam between the editing core and the server.
//! `HttpBackend` talks to the REST API; `InMemoryBackend` implements the
//! same contract in-process for offline sessions and tests.

pub mod client;
pub mod memory;
pub mod models;

pub use client::HttpBackend;
pub use memory::InMemoryBackend;
pub use models::*;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Operations of the notes REST API.
///
/// Every write returns the canonical record as stored by the server.
#[async_trait]
pub trait NotesBackend: Send + Sync {
    async fn list_notes(&self, query: &NoteQuery) -> Result<Vec<Note>>;

    async fn get_note(&self, id: &str) -> Result<Note>;

    async fn create_note(&self, data: &NoteCreate) -> Result<Note>;

    /// Patch a note. Title or content changes make the server capture a
    /// version of the previous state.
    async fn update_note(&self, id: &str, update: &NoteUpdate) -> Result<Note>;

    /// Trash a note, or remove it for good when `permanent` is set.
    /// Subtasks follow their parent either way.
    async fn delete_note(&self, id: &str, permanent: bool) -> Result<()>;

    async fn restore_note(&self, id: &str) -> Result<Note>;

    async fn complete_note(&self, id: &str) -> Result<Note>;

    async fn uncomplete_note(&self, id: &str) -> Result<Note>;

    async fn set_status(&self, id: &str, status: Option<NoteStatus>) -> Result<Note>;

    async fn remove_recurrence(&self, id: &str) -> Result<Note>;

    async fn add_tag(&self, note_id: &str, tag_id: &str) -> Result<()>;

    async fn remove_tag(&self, note_id: &str, tag_id: &str) -> Result<()>;

    /// Newest first.
    async fn list_versions(&self, note_id: &str) -> Result<Vec<NoteVersionBrief>>;

    async fn get_version(&self, note_id: &str, version_id: &str) -> Result<NoteVersion>;

    /// Copy a version forward into the live note. Existing versions are kept.
    async fn restore_version(&self, note_id: &str, version_id: &str) -> Result<Note>;

    async fn list_subtasks(&self, note_id: &str) -> Result<Vec<Note>>;

    async fn backlinks(&self, note_id: &str) -> Result<Vec<Backlink>>;

    async fn reorder_notes(&self, items: &[ReorderItem]) -> Result<()>;

    async fn list_tags(&self) -> Result<Vec<Tag>>;

    async fn create_tag(&self, data: &TagCreate) -> Result<Tag>;

    async fn create_reminder(&self, note_id: &str, remind_at: DateTime<Utc>) -> Result<Reminder>;

    async fn pending_reminders(&self) -> Result<Vec<PendingReminder>>;

    async fn fire_reminder(&self, id: &str) -> Result<Reminder>;

    async fn dismiss_reminder(&self, id: &str) -> Result<Reminder>;

    async fn snooze_reminder(&self, id: &str, minutes: u32) -> Result<Reminder>;

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>>;

    /// Newest first.
    async fn list_attachments(&self, note_id: &str) -> Result<Vec<Attachment>>;

    async fn upload_attachment(&self, note_id: &str, upload: &AttachmentUpload) -> Result<Attachment>;

    /// Raw bytes of a stored file.
    async fn attachment_data(&self, id: &str) -> Result<Vec<u8>>;

    async fn delete_attachment(&self, id: &str) -> Result<()>;
}
