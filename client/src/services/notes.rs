//! Note store
//!
//! Client-side cache of the current note list and the active selection.
//! Quick toggles are optimistic and reconcile with the server's record;
//! destructive operations wait for the server before touching the list.
//!
//! Every optimistic mutation takes a ticket for its note. A confirmation
//! is only applied if its ticket is still the newest one for that note,
//! so a slow response cannot overwrite the result of a later mutation.

use crate::api::{
    Backlink, Note, NoteCreate, NoteQuery, NoteStatus, NoteType, NoteUpdate, NotesBackend,
    RecurrenceRule, ReorderItem, SearchResult, TagBrief,
};
use crate::config::DEFAULT_SEARCH_LIMIT;
use crate::error::{AppError, Result};
use crate::services::autosave::PendingEdit;
use crate::services::optimistic;
use crate::services::ordering::position_for_move;
use crate::templates::find_template;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct StoreState {
    /// Result of the last list query, in display order.
    notes: Vec<Note>,
    /// Records loaded outside the list, e.g. subtasks opened from a note.
    detached: HashMap<String, Note>,
    active_note_id: Option<String>,
    loading: bool,
    query: NoteQuery,
    tickets: HashMap<String, u64>,
    next_ticket: u64,
}

impl StoreState {
    fn find_mut(&mut self, id: &str) -> Option<&mut Note> {
        match self.notes.iter_mut().find(|n| n.id == id) {
            Some(note) => Some(note),
            None => self.detached.get_mut(id),
        }
    }

    fn upsert(&mut self, note: Note) {
        if let Some(existing) = self.notes.iter_mut().find(|n| n.id == note.id) {
            *existing = note;
        } else {
            self.detached.insert(note.id.clone(), note);
        }
    }

    /// Drop a note and its subtasks from the list. Returns the ids removed.
    fn drop_from_list(&mut self, id: &str) -> Vec<String> {
        let is_gone = |n: &Note| n.id == id || n.parent_id.as_deref() == Some(id);

        let mut removed: Vec<String> = self
            .notes
            .iter()
            .chain(self.detached.values())
            .filter(|n| is_gone(*n))
            .map(|n| n.id.clone())
            .collect();
        if !removed.iter().any(|r| r == id) {
            removed.push(id.to_string());
        }

        self.notes.retain(|n| !is_gone(n));
        self.detached.retain(|_, n| !is_gone(&*n));
        for gone in &removed {
            self.tickets.remove(gone);
        }
        removed
    }

    /// Drop a note (and its subtasks) from view; clears the selection if it pointed there.
    fn remove(&mut self, id: &str) {
        let removed = self.drop_from_list(id);

        if let Some(active) = &self.active_note_id {
            if removed.contains(active) {
                self.active_note_id = None;
            }
        }
    }
}

/// Shared note cache; create once and pass around by `Arc`.
pub struct NoteStore {
    backend: Arc<dyn NotesBackend>,
    state: RwLock<StoreState>,
}

impl NoteStore {
    pub fn new(backend: Arc<dyn NotesBackend>) -> Self {
        Self {
            backend,
            state: RwLock::new(StoreState::default()),
        }
    }

    pub fn backend(&self) -> &Arc<dyn NotesBackend> {
        &self.backend
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Reads =====

    pub fn notes(&self) -> Vec<Note> {
        self.read().notes.clone()
    }

    pub fn get(&self, id: &str) -> Option<Note> {
        let state = self.read();
        state
            .notes
            .iter()
            .find(|n| n.id == id)
            .or_else(|| state.detached.get(id))
            .cloned()
    }

    pub fn active_note_id(&self) -> Option<String> {
        self.read().active_note_id.clone()
    }

    pub fn active_note(&self) -> Option<Note> {
        let id = self.active_note_id()?;
        self.get(&id)
    }

    pub fn set_active(&self, id: Option<&str>) {
        tracing::debug!("Active note: {:?}", id);
        self.write().active_note_id = id.map(str::to_string);
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn query(&self) -> NoteQuery {
        self.read().query.clone()
    }

    // ===== Loading =====

    /// Fetch the list for `query` and make it the current view.
    pub async fn refresh(&self, query: NoteQuery) -> Result<()> {
        {
            let mut state = self.write();
            state.query = query.clone();
            state.loading = true;
        }

        let result = self.backend.list_notes(&query).await;

        let mut state = self.write();
        state.loading = false;
        let notes = result?;
        tracing::debug!("Loaded {} notes", notes.len());
        state.notes = notes;
        Ok(())
    }

    /// Re-run the last list query.
    pub async fn reload(&self) -> Result<()> {
        self.refresh(self.query()).await
    }

    /// Fetch one note and store it, inside or outside the current list.
    pub async fn load_note(&self, id: &str) -> Result<Note> {
        let note = self.backend.get_note(id).await?;
        self.write().upsert(note.clone());
        Ok(note)
    }

    /// Store a record received from the server.
    pub fn upsert(&self, note: Note) {
        self.write().upsert(note);
    }

    /// Re-fetch a note only if it is already cached.
    async fn refresh_cached(&self, id: &str) -> Result<()> {
        if self.get(id).is_none() {
            return Ok(());
        }
        self.load_note(id).await.map(|_| ())
    }

    // ===== Optimistic mutations =====

    fn issue_ticket(&self, id: &str) -> u64 {
        let mut state = self.write();
        state.next_ticket += 1;
        let ticket = state.next_ticket;
        state.tickets.insert(id.to_string(), ticket);
        ticket
    }

    fn is_current(&self, id: &str, ticket: u64) -> bool {
        self.read().tickets.get(id) == Some(&ticket)
    }

    fn patch_local(&self, id: &str, apply: impl FnOnce(&mut Note)) {
        if let Some(note) = self.write().find_mut(id) {
            apply(note);
        }
    }

    fn confirm(&self, note: &Note, ticket: u64) {
        let mut state = self.write();
        if state.tickets.get(&note.id) != Some(&ticket) {
            tracing::debug!("Ignoring stale confirmation for note {}", note.id);
            return;
        }
        if let Some(existing) = state.find_mut(&note.id) {
            *existing = note.clone();
        }
    }

    async fn mutate<Remote>(
        &self,
        id: &str,
        label: &str,
        apply: impl FnOnce(&mut Note),
        remote: Remote,
    ) -> Result<Note>
    where
        Remote: Future<Output = Result<Note>>,
    {
        let ticket = self.issue_ticket(id);
        tracing::debug!("{} note {} (ticket {})", label, id, ticket);

        optimistic::run(
            label,
            || self.patch_local(id, apply),
            remote,
            |note| self.confirm(note, ticket),
            || self.reload(),
        )
        .await
    }

    pub async fn update_note(&self, id: &str, update: NoteUpdate) -> Result<Note> {
        self.mutate(
            id,
            "update",
            |note| update.apply_to(note),
            self.backend.update_note(id, &update),
        )
        .await
    }

    /// Persist an editor snapshot.
    pub async fn save_text(&self, edit: &PendingEdit) -> Result<Note> {
        tracing::debug!("Saving text of note {}", edit.note_id);
        self.update_note(
            &edit.note_id,
            NoteUpdate::text(edit.title.clone(), edit.content.clone()),
        )
        .await
    }

    pub async fn set_pinned(&self, id: &str, pinned: bool) -> Result<Note> {
        self.update_note(
            id,
            NoteUpdate {
                is_pinned: Some(pinned),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn set_due(&self, id: &str, due_at: DateTime<Utc>) -> Result<Note> {
        self.update_note(
            id,
            NoteUpdate {
                due_at: Some(Some(due_at)),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn clear_due(&self, id: &str) -> Result<Note> {
        self.update_note(
            id,
            NoteUpdate {
                due_at: Some(None),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn set_note_type(&self, id: &str, note_type: NoteType) -> Result<Note> {
        self.update_note(
            id,
            NoteUpdate {
                note_type: Some(note_type),
                ..Default::default()
            },
        )
        .await
    }

    /// Set or remove the repeat rule; removal goes through its own endpoint.
    pub async fn set_recurrence(&self, id: &str, rule: Option<RecurrenceRule>) -> Result<Note> {
        match rule {
            Some(rule) => {
                self.update_note(
                    id,
                    NoteUpdate {
                        recurrence_rule: Some(Some(rule)),
                        ..Default::default()
                    },
                )
                .await
            }
            None => {
                self.mutate(
                    id,
                    "remove recurrence",
                    |note| note.recurrence_rule = None,
                    self.backend.remove_recurrence(id),
                )
                .await
            }
        }
    }

    pub async fn set_status(&self, id: &str, status: Option<NoteStatus>) -> Result<Note> {
        self.mutate(
            id,
            "status",
            |note| note.status = status,
            self.backend.set_status(id, status),
        )
        .await
    }

    /// The tag endpoints only acknowledge, so the record is fetched afterwards.
    pub async fn add_tag(&self, id: &str, tag: &TagBrief) -> Result<Note> {
        let backend = &self.backend;
        self.mutate(
            id,
            "add tag",
            |note| {
                if !note.has_tag(&tag.id) {
                    note.tags.push(tag.clone());
                }
            },
            async move {
                backend.add_tag(id, &tag.id).await?;
                backend.get_note(id).await
            },
        )
        .await
    }

    pub async fn remove_tag(&self, id: &str, tag_id: &str) -> Result<Note> {
        let backend = &self.backend;
        self.mutate(
            id,
            "remove tag",
            |note| note.tags.retain(|t| t.id != tag_id),
            async move {
                backend.remove_tag(id, tag_id).await?;
                backend.get_note(id).await
            },
        )
        .await
    }

    /// Move a note of the current list to `to_index` (counted without it).
    ///
    /// Only the moved note gets a new position. Returns that position.
    pub async fn reorder(&self, id: &str, to_index: usize) -> Result<f64> {
        let (from, position) = {
            let state = self.read();
            let from = state
                .notes
                .iter()
                .position(|n| n.id == id)
                .ok_or_else(|| AppError::NotFound(format!("Note {} is not in the list", id)))?;
            let positions: Vec<f64> = state.notes.iter().map(|n| n.position).collect();
            (from, position_for_move(&positions, from, to_index))
        };

        let ticket = self.issue_ticket(id);
        tracing::debug!("Reordering note {} to {} (ticket {})", id, position, ticket);
        let items = [ReorderItem {
            id: id.to_string(),
            position,
        }];

        optimistic::run(
            "reorder",
            || {
                let mut state = self.write();
                if from < state.notes.len() && state.notes[from].id == id {
                    let mut note = state.notes.remove(from);
                    note.position = position;
                    let to = to_index.min(state.notes.len());
                    state.notes.insert(to, note);
                }
            },
            self.backend.reorder_notes(&items),
            |_| {
                if !self.is_current(id, ticket) {
                    tracing::debug!("Reorder of {} superseded by a newer mutation", id);
                }
            },
            || self.reload(),
        )
        .await?;

        Ok(position)
    }

    // ===== Server-confirmed mutations =====

    pub async fn create_note(&self, data: NoteCreate) -> Result<Note> {
        tracing::info!("Creating note: {}", data.title);
        let note = self.backend.create_note(&data).await?;

        let mut state = self.write();
        state.notes.insert(0, note.clone());
        state.active_note_id = Some(note.id.clone());
        tracing::info!("Note created successfully: {}", note.id);
        Ok(note)
    }

    /// Create a note from one of the built-in templates.
    pub async fn create_from_template(&self, template_id: &str) -> Result<Note> {
        let template = find_template(template_id, chrono::Local::now().date_naive())
            .ok_or_else(|| AppError::NotFound(format!("Template not found: {}", template_id)))?;
        self.create_note(template.note()).await
    }

    pub async fn create_subtask(&self, parent_id: &str, title: &str) -> Result<Note> {
        tracing::info!("Creating subtask of {}", parent_id);
        let note = self
            .backend
            .create_note(&NoteCreate::subtask(parent_id, title))
            .await?;
        self.write().detached.insert(note.id.clone(), note.clone());

        // Counts on the parent are server-derived
        if let Err(e) = self.refresh_cached(parent_id).await {
            tracing::warn!("Failed to refresh parent {}: {}", parent_id, e);
        }
        Ok(note)
    }

    pub async fn list_subtasks(&self, parent_id: &str) -> Result<Vec<Note>> {
        let subtasks = self.backend.list_subtasks(parent_id).await?;
        let mut state = self.write();
        for subtask in &subtasks {
            state.upsert(subtask.clone());
        }
        Ok(subtasks)
    }

    pub async fn trash(&self, id: &str) -> Result<()> {
        tracing::info!("Moving note to trash: {}", id);
        self.backend.delete_note(id, false).await?;
        self.write().remove(id);
        Ok(())
    }

    pub async fn delete_permanently(&self, id: &str) -> Result<()> {
        tracing::info!("Deleting note permanently: {}", id);
        self.backend.delete_note(id, true).await?;
        self.write().remove(id);
        Ok(())
    }

    /// Restore a note from the trash view. It leaves the current list but
    /// stays selected if it was open.
    pub async fn restore_from_trash(&self, id: &str) -> Result<Note> {
        tracing::info!("Restoring note from trash: {}", id);
        let note = self.backend.restore_note(id).await?;
        self.write().drop_from_list(id);
        Ok(note)
    }

    /// Complete a note. A recurring note spawns its next occurrence on the
    /// server, so the list is fetched again.
    pub async fn complete(&self, id: &str) -> Result<Note> {
        tracing::info!("Completing note: {}", id);
        let note = self.backend.complete_note(id).await?;
        self.write().remove(id);

        // The completion itself stands even if the refetch fails
        if note.recurrence_rule.is_some() {
            if let Err(e) = self.reload().await {
                tracing::warn!("Failed to fetch next occurrence of {}: {}", id, e);
            }
        }
        Ok(note)
    }

    pub async fn uncomplete(&self, id: &str) -> Result<Note> {
        tracing::info!("Reopening note: {}", id);
        let note = self.backend.uncomplete_note(id).await?;
        self.write().remove(id);
        Ok(note)
    }

    // ===== Passthrough =====

    pub async fn backlinks(&self, id: &str) -> Result<Vec<Backlink>> {
        self.backend.backlinks(id).await
    }

    /// Ranked full-text search, 20 results unless told otherwise.
    pub async fn search(&self, query: &str, limit: Option<u32>) -> Result<Vec<SearchResult>> {
        self.backend
            .search(query, limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::Operation;
    use crate::api::{InMemoryBackend, TagCreate};
    use std::time::Duration;

    async fn create_test_store() -> (Arc<NoteStore>, Arc<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::new());
        let store = Arc::new(NoteStore::new(backend.clone()));
        (store, backend)
    }

    async fn seed(store: &NoteStore, titles: &[&str]) -> Vec<Note> {
        let mut created = Vec::new();
        for title in titles {
            created.push(store.create_note(NoteCreate::titled(*title)).await.unwrap());
        }
        store.reload().await.unwrap();
        created
    }

    #[tokio::test]
    async fn test_create_prepends_and_activates() {
        let (store, _backend) = create_test_store().await;

        let first = store.create_note(NoteCreate::titled("First")).await.unwrap();
        let second = store.create_note(NoteCreate::titled("Second")).await.unwrap();

        let ids: Vec<String> = store.notes().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![second.id.clone(), first.id]);
        assert_eq!(store.active_note_id(), Some(second.id));
    }

    #[tokio::test]
    async fn test_create_from_template() {
        let (store, backend) = create_test_store().await;

        let note = store.create_from_template("journal").await.unwrap();

        assert_eq!(note.title, "Daily Journal");
        assert!(note.content.contains("## What am I grateful for?"));
        assert_eq!(store.active_note_id(), Some(note.id.clone()));
        assert_eq!(backend.snapshot(&note.id).unwrap().content, note.content);

        let err = store.create_from_template("recipe").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(backend.calls_of(Operation::CreateNote).len(), 1);
    }

    #[tokio::test]
    async fn test_pin_is_visible_before_server_answers() {
        let (store, backend) = create_test_store().await;
        let note = seed(&store, &["A"]).await.remove(0);

        backend.delay_next(Operation::UpdateNote, Duration::from_millis(100));
        let task = {
            let store = store.clone();
            let id = note.id.clone();
            tokio::spawn(async move { store.set_pinned(&id, true).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(store.get(&note.id).unwrap().is_pinned);
        assert!(!backend.snapshot(&note.id).unwrap().is_pinned);

        task.await.unwrap().unwrap();
        assert!(backend.snapshot(&note.id).unwrap().is_pinned);
    }

    #[tokio::test]
    async fn test_failed_tag_add_reverts_to_server_state() {
        let (store, backend) = create_test_store().await;
        let note = seed(&store, &["A"]).await.remove(0);
        let tag = backend
            .create_tag(&TagCreate {
                name: "work".to_string(),
                color: None,
            })
            .await
            .unwrap();

        backend.fail_next(Operation::AddTag);
        let result = store.add_tag(&note.id, &tag.brief()).await;

        assert!(result.is_err());
        assert!(store.get(&note.id).unwrap().tags.is_empty());
        assert_eq!(backend.calls_of(Operation::ListNotes).len(), 2);
    }

    #[tokio::test]
    async fn test_tag_add_confirms_with_server_record() {
        let (store, backend) = create_test_store().await;
        let note = seed(&store, &["A"]).await.remove(0);
        let tag = backend
            .create_tag(&TagCreate {
                name: "home".to_string(),
                color: Some("#22c55e".to_string()),
            })
            .await
            .unwrap();

        let updated = store.add_tag(&note.id, &tag.brief()).await.unwrap();

        assert_eq!(updated.tags, vec![tag.brief()]);
        assert_eq!(store.get(&note.id).unwrap().tags, vec![tag.brief()]);

        store.remove_tag(&note.id, &tag.id).await.unwrap();
        assert!(store.get(&note.id).unwrap().tags.is_empty());
    }

    #[tokio::test]
    async fn test_stale_confirmation_is_ignored() {
        let (store, backend) = create_test_store().await;
        let note = seed(&store, &["A"]).await.remove(0);

        backend.delay_next(Operation::SetStatus, Duration::from_millis(100));
        let slow = {
            let store = store.clone();
            let id = note.id.clone();
            tokio::spawn(async move { store.set_status(&id, Some(NoteStatus::Todo)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        store
            .set_status(&note.id, Some(NoteStatus::InProgress))
            .await
            .unwrap();
        slow.await.unwrap().unwrap();

        assert_eq!(
            store.get(&note.id).unwrap().status,
            Some(NoteStatus::InProgress)
        );
    }

    #[tokio::test]
    async fn test_trash_active_note_clears_selection() {
        let (store, backend) = create_test_store().await;
        let notes = seed(&store, &["A", "B"]).await;
        store.set_active(Some(&notes[0].id));

        store.trash(&notes[0].id).await.unwrap();

        assert_eq!(store.active_note_id(), None);
        assert!(store.get(&notes[0].id).is_none());
        assert!(backend.snapshot(&notes[0].id).unwrap().is_trashed);
    }

    #[tokio::test]
    async fn test_failed_trash_leaves_list_untouched() {
        let (store, backend) = create_test_store().await;
        let note = seed(&store, &["A"]).await.remove(0);
        store.set_active(Some(&note.id));

        backend.fail_next(Operation::DeleteNote);
        assert!(store.trash(&note.id).await.is_err());

        assert!(store.get(&note.id).is_some());
        assert_eq!(store.active_note_id(), Some(note.id));
    }

    #[tokio::test]
    async fn test_completing_recurring_note_shows_next_occurrence() {
        let (store, _backend) = create_test_store().await;
        let mut data = NoteCreate::titled("Standup");
        data.recurrence_rule = Some(RecurrenceRule::new(crate::api::Frequency::Daily, 1));
        let note = store.create_note(data).await.unwrap();
        store.reload().await.unwrap();

        store.complete(&note.id).await.unwrap();

        let notes = store.notes();
        assert_eq!(notes.len(), 1);
        assert_ne!(notes[0].id, note.id);
        assert_eq!(notes[0].title, "Standup");
        assert_eq!(store.active_note_id(), None);
    }

    #[tokio::test]
    async fn test_completion_stands_when_refetch_fails() {
        let (store, backend) = create_test_store().await;
        let mut data = NoteCreate::titled("Standup");
        data.recurrence_rule = Some(RecurrenceRule::new(crate::api::Frequency::Daily, 1));
        let note = store.create_note(data).await.unwrap();

        backend.fail_next(Operation::ListNotes);
        let completed = store.complete(&note.id).await.unwrap();

        assert!(completed.is_completed);
        assert!(store.get(&note.id).is_none());
        assert_eq!(store.active_note_id(), None);
    }

    #[tokio::test]
    async fn test_removed_notes_release_their_tickets() {
        let (store, _backend) = create_test_store().await;
        let notes = seed(&store, &["A", "B"]).await;
        store.set_pinned(&notes[0].id, true).await.unwrap();
        store.set_pinned(&notes[1].id, true).await.unwrap();
        assert_eq!(store.read().tickets.len(), 2);

        store.trash(&notes[0].id).await.unwrap();
        store.delete_permanently(&notes[1].id).await.unwrap();

        assert!(store.read().tickets.is_empty());
    }

    #[tokio::test]
    async fn test_restore_from_trash_keeps_selection() {
        let (store, _backend) = create_test_store().await;
        let note = seed(&store, &["A"]).await.remove(0);
        store.trash(&note.id).await.unwrap();
        store.refresh(NoteQuery::trash()).await.unwrap();
        store.set_active(Some(&note.id));

        let restored = store.restore_from_trash(&note.id).await.unwrap();

        assert!(!restored.is_trashed);
        assert!(store.notes().is_empty());
        assert_eq!(store.active_note_id(), Some(note.id));
    }

    #[tokio::test]
    async fn test_clearing_recurrence_uses_dedicated_endpoint() {
        let (store, backend) = create_test_store().await;
        let note = seed(&store, &["A"]).await.remove(0);

        store
            .set_recurrence(&note.id, Some(RecurrenceRule::new(crate::api::Frequency::Weekly, 1)))
            .await
            .unwrap();
        store.set_recurrence(&note.id, None).await.unwrap();

        assert_eq!(backend.calls_of(Operation::RemoveRecurrence).len(), 1);
        assert_eq!(store.get(&note.id).unwrap().recurrence_rule, None);
    }

    #[tokio::test]
    async fn test_reorder_moves_note_and_sets_midpoint() {
        let (store, backend) = create_test_store().await;
        seed(&store, &["A", "B", "C"]).await;
        for (i, note) in store.notes().iter().enumerate() {
            backend
                .reorder_notes(&[ReorderItem {
                    id: note.id.clone(),
                    position: (i + 1) as f64,
                }])
                .await
                .unwrap();
        }
        store.reload().await.unwrap();
        let before: Vec<String> = store.notes().into_iter().map(|n| n.id).collect();

        // last to the middle
        let position = store.reorder(&before[2], 1).await.unwrap();

        assert_eq!(position, 1.5);
        let after: Vec<String> = store.notes().into_iter().map(|n| n.id).collect();
        assert_eq!(after, vec![before[0].clone(), before[2].clone(), before[1].clone()]);
        assert_eq!(backend.snapshot(&before[2]).unwrap().position, 1.5);
    }

    #[tokio::test]
    async fn test_failed_reorder_refetches() {
        let (store, backend) = create_test_store().await;
        seed(&store, &["A", "B"]).await;
        let before: Vec<String> = store.notes().into_iter().map(|n| n.id).collect();

        backend.fail_next(Operation::ReorderNotes);
        assert!(store.reorder(&before[1], 0).await.is_err());

        let after: Vec<String> = store.notes().into_iter().map(|n| n.id).collect();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_subtask_creation_refreshes_parent_counts() {
        let (store, _backend) = create_test_store().await;
        let parent = seed(&store, &["Parent"]).await.remove(0);

        let child = store.create_subtask(&parent.id, "Child").await.unwrap();

        assert_eq!(store.get(&parent.id).unwrap().subtask_count, 1);
        assert_eq!(store.get(&child.id).unwrap().parent_id, Some(parent.id.clone()));
        assert_eq!(store.notes().len(), 1);

        let subtasks = store.list_subtasks(&parent.id).await.unwrap();
        assert_eq!(subtasks.len(), 1);
    }
}
