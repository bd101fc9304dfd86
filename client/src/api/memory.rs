//! In-process notes backend
//!
//! Implements the same contract as the REST API, including the server's
//! side effects: version capture on text updates, copy-forward restore,
//! trash cascading to subtasks, one-level nesting and recurring
//! completion. Every call is recorded; failures and latency can be
//! injected per operation.

use super::models::*;
use super::NotesBackend;
use crate::config::{
    ALLOWED_ATTACHMENT_TYPES, ATTACHMENT_MAX_BYTES, DEFAULT_TAG_COLOR, VERSION_LIST_LIMIT,
};
use crate::error::{AppError, Result};
use crate::wiki::extract_wiki_links;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use uuid::Uuid;

const NESTING_ERROR: &str = "Cannot nest subtasks more than one level deep";

/// Backend operation, used to inspect calls and inject faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListNotes,
    GetNote,
    CreateNote,
    UpdateNote,
    DeleteNote,
    RestoreNote,
    CompleteNote,
    UncompleteNote,
    SetStatus,
    RemoveRecurrence,
    AddTag,
    RemoveTag,
    ListVersions,
    GetVersion,
    RestoreVersion,
    ListSubtasks,
    Backlinks,
    ReorderNotes,
    ListTags,
    CreateTag,
    CreateReminder,
    PendingReminders,
    FireReminder,
    DismissReminder,
    SnoozeReminder,
    Search,
    ListAttachments,
    UploadAttachment,
    AttachmentData,
    DeleteAttachment,
}

/// A recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub op: Operation,
    pub target: Option<String>,
    pub update: Option<NoteUpdate>,
}

struct StoredNote {
    note: Note,
    tag_ids: Vec<String>,
    /// Sequence number of the last write; newest first in lists.
    touched: u64,
    created: u64,
}

struct StoredVersion {
    version: NoteVersion,
    seq: u64,
}

struct StoredAttachment {
    attachment: Attachment,
    data: Vec<u8>,
    seq: u64,
}

#[derive(Default)]
struct State {
    notes: HashMap<String, StoredNote>,
    versions: Vec<StoredVersion>,
    tags: HashMap<String, Tag>,
    reminders: Vec<Reminder>,
    attachments: Vec<StoredAttachment>,
    seq: u64,
}

#[derive(Default)]
struct Control {
    calls: Vec<Call>,
    failures: HashSet<Operation>,
    delays: HashMap<Operation, Duration>,
}

#[derive(Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
    control: Mutex<Control>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn bad_request(message: &str) -> AppError {
    AppError::Api {
        status: 400,
        message: message.to_string(),
    }
}

fn note_not_found() -> AppError {
    AppError::NotFound("Note not found".to_string())
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn blank_note(title: String, content: String, now: DateTime<Utc>) -> Note {
    Note {
        id: new_id(),
        title,
        content,
        note_type: NoteType::Note,
        folder_id: None,
        parent_id: None,
        position: 0.0,
        tags: Vec::new(),
        is_pinned: false,
        is_trashed: false,
        trashed_at: None,
        is_completed: false,
        completed_at: None,
        status: None,
        due_at: None,
        recurrence_rule: None,
        is_daily: false,
        daily_date: None,
        subtask_count: 0,
        subtask_completed: 0,
        created_at: now,
        updated_at: now,
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls issued so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.control).calls.clone()
    }

    pub fn calls_of(&self, op: Operation) -> Vec<Call> {
        lock(&self.control)
            .calls
            .iter()
            .filter(|call| call.op == op)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        lock(&self.control).calls.clear();
    }

    /// Make the next call of `op` fail with a 503.
    #[cfg(any(test, feature = "test-util"))]
    pub fn fail_next(&self, op: Operation) {
        lock(&self.control).failures.insert(op);
    }

    /// Hold the next call of `op` for `delay` before it is processed.
    #[cfg(any(test, feature = "test-util"))]
    pub fn delay_next(&self, op: Operation, delay: Duration) {
        lock(&self.control).delays.insert(op, delay);
    }

    /// Server-side record of a note, without recording a call.
    pub fn snapshot(&self, id: &str) -> Option<Note> {
        lock(&self.state).render(id).ok()
    }

    async fn begin(
        &self,
        op: Operation,
        target: Option<&str>,
        update: Option<&NoteUpdate>,
    ) -> Result<()> {
        let delay = {
            let mut control = lock(&self.control);
            control.calls.push(Call {
                op,
                target: target.map(str::to_string),
                update: update.cloned(),
            });
            if control.failures.remove(&op) {
                tracing::debug!(?op, "Injected backend failure");
                return Err(AppError::Api {
                    status: 503,
                    message: "injected failure".to_string(),
                });
            }
            control.delays.remove(&op)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        lock(&self.state)
    }
}

impl State {
    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn stored(&self, id: &str) -> Result<&StoredNote> {
        self.notes.get(id).ok_or_else(note_not_found)
    }

    fn stored_mut(&mut self, id: &str) -> Result<&mut StoredNote> {
        self.notes.get_mut(id).ok_or_else(note_not_found)
    }

    fn children(&self, id: &str) -> Vec<String> {
        self.notes
            .values()
            .filter(|s| s.note.parent_id.as_deref() == Some(id))
            .map(|s| s.note.id.clone())
            .collect()
    }

    fn insert(&mut self, note: Note, tag_ids: Vec<String>) -> String {
        let seq = self.next_seq();
        let id = note.id.clone();
        self.notes.insert(
            id.clone(),
            StoredNote {
                note,
                tag_ids,
                touched: seq,
                created: seq,
            },
        );
        id
    }

    fn touch(&mut self, id: &str) -> Result<()> {
        let seq = self.next_seq();
        let stored = self.stored_mut(id)?;
        stored.touched = seq;
        stored.note.updated_at = Utc::now();
        Ok(())
    }

    /// The note as the server would return it, with derived fields filled in.
    fn render(&self, id: &str) -> Result<Note> {
        let stored = self.stored(id)?;
        let mut note = stored.note.clone();

        let mut tags: Vec<TagBrief> = stored
            .tag_ids
            .iter()
            .filter_map(|tag_id| self.tags.get(tag_id))
            .map(Tag::brief)
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        note.tags = tags;

        let (total, completed) = self
            .notes
            .values()
            .filter(|s| s.note.parent_id.as_deref() == Some(id))
            .fold((0, 0), |(total, completed), s| {
                (total + 1, completed + u32::from(s.note.is_completed))
            });
        note.subtask_count = total;
        note.subtask_completed = completed;

        Ok(note)
    }

    fn render_all<'a>(&self, stored: impl Iterator<Item = &'a StoredNote>) -> Vec<Note> {
        stored
            .filter_map(|s| self.render(&s.note.id).ok())
            .collect()
    }

    fn matches(stored: &StoredNote, query: &NoteQuery) -> bool {
        let note = &stored.note;

        if note.is_trashed != query.trashed {
            return false;
        }
        match &query.parent_id {
            Some(parent) if note.parent_id.as_ref() != Some(parent) => return false,
            None if note.parent_id.is_some() => return false,
            _ => {}
        }
        if query.completed == Some(true) {
            if !note.is_completed {
                return false;
            }
        } else if !query.trashed && note.is_completed {
            return false;
        }
        if let Some(folder) = &query.folder_id {
            if note.folder_id.as_ref() != Some(folder) {
                return false;
            }
        }
        if let Some(tag) = &query.tag_id {
            if !stored.tag_ids.contains(tag) {
                return false;
            }
        }
        if query.pinned == Some(true) && !note.is_pinned {
            return false;
        }
        if let Some(status) = query.status {
            if note.status != Some(status) {
                return false;
            }
        }
        true
    }

    fn list_notes(&self, query: &NoteQuery) -> Vec<Note> {
        let mut matched: Vec<&StoredNote> = self
            .notes
            .values()
            .filter(|s| Self::matches(s, query))
            .collect();
        matched.sort_by(|a, b| {
            b.note
                .is_pinned
                .cmp(&a.note.is_pinned)
                .then(b.touched.cmp(&a.touched))
        });
        self.render_all(matched.into_iter())
    }

    fn create_note(&mut self, data: &NoteCreate) -> Result<Note> {
        let folder_id = match &data.parent_id {
            Some(parent_id) => {
                let parent = self
                    .notes
                    .get(parent_id)
                    .ok_or_else(|| AppError::NotFound("Parent note not found".to_string()))?;
                if parent.note.parent_id.is_some() {
                    return Err(bad_request(NESTING_ERROR));
                }
                if parent.note.is_daily {
                    return Err(bad_request("Daily notes cannot have subtasks"));
                }
                parent.note.folder_id.clone()
            }
            None => data.folder_id.clone(),
        };

        let mut note = blank_note(data.title.clone(), data.content.clone(), Utc::now());
        note.note_type = data.note_type;
        note.folder_id = folder_id;
        note.parent_id = data.parent_id.clone();
        note.status = data.status;
        note.recurrence_rule = data.recurrence_rule;

        let id = self.insert(note, Vec::new());
        self.render(&id)
    }

    fn push_version(&mut self, note_id: &str, title: String, content: String) {
        let seq = self.next_seq();
        self.versions.push(StoredVersion {
            version: NoteVersion {
                id: new_id(),
                note_id: note_id.to_string(),
                title,
                content,
                created_at: Utc::now(),
            },
            seq,
        });
    }

    fn validate_parent(&self, id: &str, parent_id: &str) -> Result<()> {
        if parent_id == id {
            return Err(bad_request("A note cannot be its own parent"));
        }
        let parent = self
            .notes
            .get(parent_id)
            .ok_or_else(|| AppError::NotFound("Parent note not found".to_string()))?;
        if parent.note.parent_id.is_some() {
            return Err(bad_request(NESTING_ERROR));
        }
        if self.stored(id)?.note.is_daily {
            return Err(bad_request("Daily notes cannot be subtasks"));
        }
        if !self.children(id).is_empty() {
            return Err(bad_request("Notes with subtasks cannot become subtasks"));
        }
        Ok(())
    }

    fn update_note(&mut self, id: &str, update: &NoteUpdate) -> Result<Note> {
        let current = self.stored(id)?.note.clone();

        if let Some(Some(parent_id)) = &update.parent_id {
            self.validate_parent(id, parent_id)?;
        }

        if update.touches_text() {
            self.push_version(id, current.title, current.content);
        }

        update.apply_to(&mut self.stored_mut(id)?.note);
        self.touch(id)?;
        self.render(id)
    }

    fn dismiss_pending_reminders(&mut self, note_id: &str) {
        for reminder in self
            .reminders
            .iter_mut()
            .filter(|r| r.note_id == note_id && !r.is_fired)
        {
            reminder.is_dismissed = true;
        }
    }

    fn delete_note(&mut self, id: &str, permanent: bool) -> Result<()> {
        self.stored(id)?;
        self.dismiss_pending_reminders(id);

        let mut affected = self.children(id);
        affected.push(id.to_string());

        if permanent {
            for note_id in &affected {
                self.notes.remove(note_id);
                self.versions.retain(|v| &v.version.note_id != note_id);
                self.reminders.retain(|r| &r.note_id != note_id);
                self.attachments.retain(|a| &a.attachment.note_id != note_id);
            }
        } else {
            let now = Utc::now();
            for note_id in &affected {
                let stored = self.stored_mut(note_id)?;
                stored.note.is_trashed = true;
                stored.note.trashed_at = Some(now);
            }
        }
        Ok(())
    }

    fn restore_note(&mut self, id: &str) -> Result<Note> {
        self.stored(id)?;

        let mut affected = self.children(id);
        affected.push(id.to_string());
        for note_id in &affected {
            let stored = self.stored_mut(note_id)?;
            stored.note.is_trashed = false;
            stored.note.trashed_at = None;
        }
        self.render(id)
    }

    fn complete_note(&mut self, id: &str) -> Result<Note> {
        let now = Utc::now();
        let (source, tag_ids) = {
            let stored = self.stored_mut(id)?;
            stored.note.is_completed = true;
            stored.note.completed_at = Some(now);
            if stored.note.status.is_some() {
                stored.note.status = Some(NoteStatus::Done);
            }
            (stored.note.clone(), stored.tag_ids.clone())
        };
        self.dismiss_pending_reminders(id);

        if let Some(rule) = source.recurrence_rule {
            let mut next = blank_note(source.title, source.content, now);
            next.folder_id = source.folder_id;
            next.note_type = source.note_type;
            next.status = source.status.map(|_| NoteStatus::Todo);
            next.recurrence_rule = Some(rule);
            next.due_at = rule.advance(source.due_at.unwrap_or(now));
            let next_id = self.insert(next, tag_ids);
            tracing::debug!("Spawned next occurrence {} of {}", next_id, id);
        }

        self.render(id)
    }

    fn uncomplete_note(&mut self, id: &str) -> Result<Note> {
        let stored = self.stored_mut(id)?;
        stored.note.is_completed = false;
        stored.note.completed_at = None;
        if stored.note.status == Some(NoteStatus::Done) {
            stored.note.status = Some(NoteStatus::Todo);
        }
        self.render(id)
    }

    fn set_status(&mut self, id: &str, status: Option<NoteStatus>) -> Result<Note> {
        self.stored_mut(id)?.note.status = status;
        self.touch(id)?;
        self.render(id)
    }

    fn remove_recurrence(&mut self, id: &str) -> Result<Note> {
        self.stored_mut(id)?.note.recurrence_rule = None;
        self.touch(id)?;
        self.render(id)
    }

    fn add_tag(&mut self, note_id: &str, tag_id: &str) -> Result<()> {
        self.stored(note_id)?;
        if !self.tags.contains_key(tag_id) {
            return Err(AppError::NotFound("Tag not found".to_string()));
        }
        let stored = self.stored_mut(note_id)?;
        if !stored.tag_ids.iter().any(|t| t == tag_id) {
            stored.tag_ids.push(tag_id.to_string());
        }
        Ok(())
    }

    fn remove_tag(&mut self, note_id: &str, tag_id: &str) {
        if let Some(stored) = self.notes.get_mut(note_id) {
            stored.tag_ids.retain(|t| t != tag_id);
        }
    }

    fn list_versions(&self, note_id: &str) -> Result<Vec<NoteVersionBrief>> {
        self.stored(note_id)?;

        let mut versions: Vec<&StoredVersion> = self
            .versions
            .iter()
            .filter(|v| v.version.note_id == note_id)
            .collect();
        versions.sort_by(|a, b| b.seq.cmp(&a.seq));

        Ok(versions
            .into_iter()
            .take(VERSION_LIST_LIMIT)
            .map(|v| v.version.brief())
            .collect())
    }

    fn get_version(&self, note_id: &str, version_id: &str) -> Result<NoteVersion> {
        self.versions
            .iter()
            .map(|v| &v.version)
            .find(|v| v.id == version_id && v.note_id == note_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Version not found".to_string()))
    }

    fn restore_version(&mut self, note_id: &str, version_id: &str) -> Result<Note> {
        let current = self.stored(note_id)?.note.clone();
        let version = self.get_version(note_id, version_id)?;

        self.push_version(note_id, current.title, current.content);

        let stored = self.stored_mut(note_id)?;
        stored.note.title = version.title;
        stored.note.content = version.content;
        self.touch(note_id)?;
        self.render(note_id)
    }

    fn list_subtasks(&self, note_id: &str) -> Result<Vec<Note>> {
        self.stored(note_id)?;

        let mut subtasks: Vec<&StoredNote> = self
            .notes
            .values()
            .filter(|s| s.note.parent_id.as_deref() == Some(note_id) && !s.note.is_trashed)
            .collect();
        subtasks.sort_by(|a, b| {
            a.note
                .position
                .total_cmp(&b.note.position)
                .then(a.created.cmp(&b.created))
        });
        Ok(self.render_all(subtasks.into_iter()))
    }

    fn backlinks(&self, note_id: &str) -> Result<Vec<Backlink>> {
        let title = self.stored(note_id)?.note.title.clone();

        let mut sources: Vec<&StoredNote> = self
            .notes
            .values()
            .filter(|s| s.note.id != note_id && !s.note.is_trashed)
            .filter(|s| extract_wiki_links(&s.note.content).contains(&title))
            .collect();
        sources.sort_by(|a, b| b.touched.cmp(&a.touched));

        Ok(sources
            .into_iter()
            .map(|s| Backlink {
                id: s.note.id.clone(),
                title: s.note.title.clone(),
                updated_at: s.note.updated_at,
            })
            .collect())
    }

    fn reorder_notes(&mut self, items: &[ReorderItem]) {
        for item in items {
            if let Some(stored) = self.notes.get_mut(&item.id) {
                stored.note.position = item.position;
            }
        }
    }

    fn list_tags(&self) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self
            .tags
            .values()
            .map(|tag| {
                let mut tag = tag.clone();
                tag.note_count = self
                    .notes
                    .values()
                    .filter(|s| s.tag_ids.contains(&tag.id))
                    .count() as u32;
                tag
            })
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tags
    }

    fn create_tag(&mut self, data: &TagCreate) -> Result<Tag> {
        if self.tags.values().any(|t| t.name == data.name) {
            return Err(AppError::Api {
                status: 409,
                message: "Tag already exists".to_string(),
            });
        }
        let tag = Tag {
            id: new_id(),
            name: data.name.clone(),
            color: data
                .color
                .clone()
                .unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string()),
            created_at: Utc::now(),
            note_count: 0,
        };
        self.tags.insert(tag.id.clone(), tag.clone());
        Ok(tag)
    }

    fn create_reminder(&mut self, note_id: &str, remind_at: DateTime<Utc>) -> Result<Reminder> {
        self.stored(note_id)?;
        let reminder = Reminder {
            id: new_id(),
            note_id: note_id.to_string(),
            remind_at,
            is_fired: false,
            is_dismissed: false,
            created_at: Utc::now(),
        };
        self.reminders.push(reminder.clone());
        Ok(reminder)
    }

    fn pending_reminders(&self) -> Vec<PendingReminder> {
        let mut pending: Vec<PendingReminder> = self
            .reminders
            .iter()
            .filter(|r| !r.is_fired && !r.is_dismissed)
            .map(|r| PendingReminder {
                id: r.id.clone(),
                note_id: r.note_id.clone(),
                note_title: self
                    .notes
                    .get(&r.note_id)
                    .map(|s| s.note.title.clone())
                    .unwrap_or_else(|| "Deleted note".to_string()),
                remind_at: r.remind_at,
                is_fired: r.is_fired,
                is_dismissed: r.is_dismissed,
            })
            .collect();
        pending.sort_by_key(|r| r.remind_at);
        pending
    }

    fn list_attachments(&self, note_id: &str) -> Result<Vec<Attachment>> {
        self.stored(note_id)?;
        let mut found: Vec<&StoredAttachment> = self
            .attachments
            .iter()
            .filter(|a| a.attachment.note_id == note_id)
            .collect();
        found.sort_by(|a, b| b.seq.cmp(&a.seq));
        Ok(found.into_iter().map(|a| a.attachment.clone()).collect())
    }

    fn upload_attachment(&mut self, note_id: &str, upload: &AttachmentUpload) -> Result<Attachment> {
        self.stored(note_id)?;
        if !ALLOWED_ATTACHMENT_TYPES.contains(&upload.mime_type.as_str()) {
            return Err(bad_request(&format!(
                "File type {} not allowed",
                upload.mime_type
            )));
        }
        if upload.data.len() > ATTACHMENT_MAX_BYTES {
            return Err(bad_request("File too large (max 10MB)"));
        }

        let id = new_id();
        let extension = upload
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| format!(".{ext}"))
            .unwrap_or_default();
        let attachment = Attachment {
            filename: format!("{id}{extension}"),
            note_id: note_id.to_string(),
            original_filename: upload.filename.clone(),
            mime_type: upload.mime_type.clone(),
            size_bytes: upload.data.len() as u64,
            created_at: Utc::now(),
            url: format!("/api/attachments/{id}/file"),
            id,
        };
        let seq = self.next_seq();
        self.attachments.push(StoredAttachment {
            attachment: attachment.clone(),
            data: upload.data.clone(),
            seq,
        });
        Ok(attachment)
    }

    fn attachment_index(&self, id: &str) -> Result<usize> {
        self.attachments
            .iter()
            .position(|a| a.attachment.id == id)
            .ok_or_else(|| AppError::NotFound("Attachment not found".to_string()))
    }

    fn reminder_mut(&mut self, id: &str) -> Result<&mut Reminder> {
        self.reminders
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound("Reminder not found".to_string()))
    }

    fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(AppError::Api {
                status: 422,
                message: "Search query must not be empty".to_string(),
            });
        }

        let mut hits: Vec<(f64, u64, SearchResult)> = self
            .notes
            .values()
            .filter(|s| !s.note.is_trashed)
            .filter_map(|s| {
                let in_title = s.note.title.to_lowercase().contains(&needle);
                let in_content = s.note.content.to_lowercase().contains(&needle);
                let rank = match (in_title, in_content) {
                    (true, true) => 3.0,
                    (true, false) => 2.0,
                    (false, true) => 1.0,
                    (false, false) => return None,
                };
                let result = SearchResult {
                    id: s.note.id.clone(),
                    title: s.note.title.clone(),
                    snippet: s.note.content.chars().take(96).collect(),
                    folder_id: s.note.folder_id.clone(),
                    folder_name: None,
                    rank,
                };
                Some((rank, s.touched, result))
            })
            .collect();
        hits.sort_by(|a, b| b.0.total_cmp(&a.0).then(b.1.cmp(&a.1)));

        Ok(hits
            .into_iter()
            .take(limit as usize)
            .map(|(_, _, result)| result)
            .collect())
    }
}

#[async_trait]
impl NotesBackend for InMemoryBackend {
    async fn list_notes(&self, query: &NoteQuery) -> Result<Vec<Note>> {
        self.begin(Operation::ListNotes, None, None).await?;
        Ok(self.state().list_notes(query))
    }

    async fn get_note(&self, id: &str) -> Result<Note> {
        self.begin(Operation::GetNote, Some(id), None).await?;
        self.state().render(id)
    }

    async fn create_note(&self, data: &NoteCreate) -> Result<Note> {
        self.begin(Operation::CreateNote, data.parent_id.as_deref(), None)
            .await?;
        self.state().create_note(data)
    }

    async fn update_note(&self, id: &str, update: &NoteUpdate) -> Result<Note> {
        self.begin(Operation::UpdateNote, Some(id), Some(update))
            .await?;
        self.state().update_note(id, update)
    }

    async fn delete_note(&self, id: &str, permanent: bool) -> Result<()> {
        self.begin(Operation::DeleteNote, Some(id), None).await?;
        self.state().delete_note(id, permanent)
    }

    async fn restore_note(&self, id: &str) -> Result<Note> {
        self.begin(Operation::RestoreNote, Some(id), None).await?;
        self.state().restore_note(id)
    }

    async fn complete_note(&self, id: &str) -> Result<Note> {
        self.begin(Operation::CompleteNote, Some(id), None).await?;
        self.state().complete_note(id)
    }

    async fn uncomplete_note(&self, id: &str) -> Result<Note> {
        self.begin(Operation::UncompleteNote, Some(id), None).await?;
        self.state().uncomplete_note(id)
    }

    async fn set_status(&self, id: &str, status: Option<NoteStatus>) -> Result<Note> {
        self.begin(Operation::SetStatus, Some(id), None).await?;
        self.state().set_status(id, status)
    }

    async fn remove_recurrence(&self, id: &str) -> Result<Note> {
        self.begin(Operation::RemoveRecurrence, Some(id), None).await?;
        self.state().remove_recurrence(id)
    }

    async fn add_tag(&self, note_id: &str, tag_id: &str) -> Result<()> {
        self.begin(Operation::AddTag, Some(note_id), None).await?;
        self.state().add_tag(note_id, tag_id)
    }

    async fn remove_tag(&self, note_id: &str, tag_id: &str) -> Result<()> {
        self.begin(Operation::RemoveTag, Some(note_id), None).await?;
        self.state().remove_tag(note_id, tag_id);
        Ok(())
    }

    async fn list_versions(&self, note_id: &str) -> Result<Vec<NoteVersionBrief>> {
        self.begin(Operation::ListVersions, Some(note_id), None).await?;
        self.state().list_versions(note_id)
    }

    async fn get_version(&self, note_id: &str, version_id: &str) -> Result<NoteVersion> {
        self.begin(Operation::GetVersion, Some(note_id), None).await?;
        self.state().get_version(note_id, version_id)
    }

    async fn restore_version(&self, note_id: &str, version_id: &str) -> Result<Note> {
        self.begin(Operation::RestoreVersion, Some(note_id), None)
            .await?;
        self.state().restore_version(note_id, version_id)
    }

    async fn list_subtasks(&self, note_id: &str) -> Result<Vec<Note>> {
        self.begin(Operation::ListSubtasks, Some(note_id), None).await?;
        self.state().list_subtasks(note_id)
    }

    async fn backlinks(&self, note_id: &str) -> Result<Vec<Backlink>> {
        self.begin(Operation::Backlinks, Some(note_id), None).await?;
        self.state().backlinks(note_id)
    }

    async fn reorder_notes(&self, items: &[ReorderItem]) -> Result<()> {
        let target = items.first().map(|item| item.id.as_str());
        self.begin(Operation::ReorderNotes, target, None).await?;
        self.state().reorder_notes(items);
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.begin(Operation::ListTags, None, None).await?;
        Ok(self.state().list_tags())
    }

    async fn create_tag(&self, data: &TagCreate) -> Result<Tag> {
        self.begin(Operation::CreateTag, None, None).await?;
        self.state().create_tag(data)
    }

    async fn create_reminder(&self, note_id: &str, remind_at: DateTime<Utc>) -> Result<Reminder> {
        self.begin(Operation::CreateReminder, Some(note_id), None)
            .await?;
        self.state().create_reminder(note_id, remind_at)
    }

    async fn pending_reminders(&self) -> Result<Vec<PendingReminder>> {
        self.begin(Operation::PendingReminders, None, None).await?;
        Ok(self.state().pending_reminders())
    }

    async fn fire_reminder(&self, id: &str) -> Result<Reminder> {
        self.begin(Operation::FireReminder, Some(id), None).await?;
        let mut state = self.state();
        let reminder = state.reminder_mut(id)?;
        reminder.is_fired = true;
        Ok(reminder.clone())
    }

    async fn dismiss_reminder(&self, id: &str) -> Result<Reminder> {
        self.begin(Operation::DismissReminder, Some(id), None).await?;
        let mut state = self.state();
        let reminder = state.reminder_mut(id)?;
        reminder.is_dismissed = true;
        Ok(reminder.clone())
    }

    async fn snooze_reminder(&self, id: &str, minutes: u32) -> Result<Reminder> {
        self.begin(Operation::SnoozeReminder, Some(id), None).await?;
        let mut state = self.state();
        let reminder = state.reminder_mut(id)?;
        reminder.remind_at += chrono::Duration::minutes(i64::from(minutes));
        reminder.is_fired = false;
        reminder.is_dismissed = false;
        Ok(reminder.clone())
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>> {
        self.begin(Operation::Search, None, None).await?;
        self.state().search(query, limit)
    }

    async fn list_attachments(&self, note_id: &str) -> Result<Vec<Attachment>> {
        self.begin(Operation::ListAttachments, Some(note_id), None).await?;
        self.state().list_attachments(note_id)
    }

    async fn upload_attachment(&self, note_id: &str, upload: &AttachmentUpload) -> Result<Attachment> {
        self.begin(Operation::UploadAttachment, Some(note_id), None).await?;
        self.state().upload_attachment(note_id, upload)
    }

    async fn attachment_data(&self, id: &str) -> Result<Vec<u8>> {
        self.begin(Operation::AttachmentData, Some(id), None).await?;
        let state = self.state();
        let index = state.attachment_index(id)?;
        Ok(state.attachments[index].data.clone())
    }

    async fn delete_attachment(&self, id: &str) -> Result<()> {
        self.begin(Operation::DeleteAttachment, Some(id), None).await?;
        let mut state = self.state();
        let index = state.attachment_index(id)?;
        state.attachments.remove(index);
        Ok(())
    }
}
