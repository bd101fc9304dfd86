//! Editor session
//!
//! Coordinates one editor: the autosave buffer, the text currently shown,
//! the breadcrumb trail and the history panel. All mutations go through
//! the shared `NoteStore`.
//!
//! Any pending edit is flushed before another note is shown, so an edit
//! is always saved against the note it was typed into. When the session
//! goes away with an edit still buffered, the save is handed to the
//! `TaskQueue` and finishes on its own.

use crate::api::{Note, NoteVersion, NoteVersionBrief};
use crate::config::{DEFAULT_AUTO_SAVE_DELAY_MS, SAVED_INDICATOR_MS};
use crate::error::{AppError, Result};
use crate::services::autosave::{AutosaveScheduler, PendingEdit};
use crate::services::clock::Clock;
use crate::services::navigation::{Breadcrumbs, Crumb};
use crate::services::notes::NoteStore;
use crate::services::tasks::TaskQueue;
use crate::services::versions::VersionService;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy)]
pub struct EditorOptions {
    pub autosave_delay: Duration,
    pub saved_indicator: Duration,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            autosave_delay: Duration::from_millis(u64::from(DEFAULT_AUTO_SAVE_DELAY_MS)),
            saved_indicator: Duration::from_millis(u64::from(SAVED_INDICATOR_MS)),
        }
    }
}

/// What the editor currently shows
#[derive(Debug, Clone, PartialEq)]
pub struct EditorView {
    pub note_id: String,
    pub title: String,
    pub content: String,
    /// Local text differs from what the server confirmed.
    pub dirty: bool,
    pub saving: bool,
    pub saved_at: Option<Instant>,
    pub history_open: bool,
}

impl EditorView {
    fn from_note(note: &Note) -> Self {
        Self {
            note_id: note.id.clone(),
            title: note.title.clone(),
            content: note.content.clone(),
            dirty: false,
            saving: false,
            saved_at: None,
            history_open: false,
        }
    }
}

struct EditorInner {
    scheduler: AutosaveScheduler,
    view: Option<EditorView>,
    breadcrumbs: Breadcrumbs,
    popover_open: bool,
    saves_in_flight: usize,
}

pub struct EditorSession {
    store: Arc<NoteStore>,
    versions: VersionService,
    tasks: TaskQueue,
    clock: Arc<dyn Clock>,
    saved_indicator: Duration,
    inner: Mutex<EditorInner>,
    wake: Arc<Notify>,
    cancel: CancellationToken,
}

impl EditorSession {
    pub fn new(
        store: Arc<NoteStore>,
        tasks: TaskQueue,
        clock: Arc<dyn Clock>,
        options: EditorOptions,
    ) -> Self {
        Self {
            versions: VersionService::new(store.clone()),
            store,
            tasks,
            clock,
            saved_indicator: options.saved_indicator,
            inner: Mutex::new(EditorInner {
                scheduler: AutosaveScheduler::new(options.autosave_delay),
                view: None,
                breadcrumbs: Breadcrumbs::new(),
                popover_open: false,
                saves_in_flight: 0,
            }),
            wake: Arc::new(Notify::new()),
            cancel: CancellationToken::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EditorInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== State =====

    pub fn view(&self) -> Option<EditorView> {
        self.lock().view.clone()
    }

    pub fn note_id(&self) -> Option<String> {
        self.lock().view.as_ref().map(|v| v.note_id.clone())
    }

    pub fn breadcrumbs(&self) -> Vec<Crumb> {
        self.lock().breadcrumbs.as_slice().to_vec()
    }

    pub fn pending_edit(&self) -> Option<PendingEdit> {
        self.lock().scheduler.pending().cloned()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.lock().scheduler.deadline()
    }

    /// Whether the "Saved" confirmation is showing.
    pub fn is_just_saved(&self) -> bool {
        let saved_at = self.lock().view.as_ref().and_then(|v| v.saved_at);
        saved_at.is_some_and(|at| self.clock.now() < at + self.saved_indicator)
    }

    /// Popovers capture Escape while open.
    pub fn set_popover_open(&self, open: bool) {
        self.lock().popover_open = open;
    }

    // ===== Editing =====

    pub fn edit_title(&self, title: &str) {
        self.record_edit(|view| view.title = title.to_string());
    }

    pub fn edit_content(&self, content: &str) {
        self.record_edit(|view| view.content = content.to_string());
    }

    fn record_edit(&self, change: impl FnOnce(&mut EditorView)) {
        let now = self.clock.now();
        let mut inner = self.lock();
        let Some(view) = inner.view.as_mut() else {
            tracing::debug!("Ignoring edit with no note open");
            return;
        };

        change(view);
        view.dirty = true;
        view.saved_at = None;
        let edit = PendingEdit {
            note_id: view.note_id.clone(),
            title: view.title.clone(),
            content: view.content.clone(),
        };
        inner.scheduler.edit(edit, now);
        drop(inner);

        self.wake.notify_one();
    }

    /// Persist the pending edit now, if there is one.
    pub async fn flush(&self) -> Result<()> {
        let edit = self.lock().scheduler.flush();
        match edit {
            Some(edit) => self.persist(edit).await,
            None => Ok(()),
        }
    }

    /// Explicit save shortcut.
    pub async fn save_now(&self) -> Result<()> {
        self.flush().await
    }

    /// Persist the pending edit if its quiet period is over.
    pub async fn tick(&self) -> Result<()> {
        let edit = self.lock().scheduler.tick(self.clock.now());
        match edit {
            Some(edit) => self.persist(edit).await,
            None => Ok(()),
        }
    }

    async fn persist(&self, edit: PendingEdit) -> Result<()> {
        {
            let mut inner = self.lock();
            inner.saves_in_flight += 1;
            if let Some(view) = inner.view.as_mut().filter(|v| v.note_id == edit.note_id) {
                view.saving = true;
            }
        }

        let result = self.store.save_text(&edit).await;

        let now = self.clock.now();
        let mut inner = self.lock();
        inner.saves_in_flight -= 1;
        let in_flight = inner.saves_in_flight;
        let newer_pending = !inner.scheduler.is_idle();

        if let Some(view) = inner.view.as_mut().filter(|v| v.note_id == edit.note_id) {
            view.saving = in_flight > 0;
            if result.is_ok() && !newer_pending {
                view.dirty = false;
                view.saved_at = Some(now);
            }
        }
        drop(inner);

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!("Saving note {} failed, edit dropped: {}", edit.note_id, e);
                Err(e)
            }
        }
    }

    // ===== Selection =====

    /// Show another note (or none). The pending edit is saved first.
    pub async fn select(&self, id: Option<&str>) -> Result<()> {
        // A failed save is already logged; switching still happens
        let _ = self.flush().await;

        let Some(id) = id else {
            self.store.set_active(None);
            self.lock().view = None;
            return Ok(());
        };

        if self.note_id().as_deref() == Some(id) {
            self.store.set_active(Some(id));
            return Ok(());
        }

        let note = match self.store.get(id) {
            Some(note) => note,
            None => self.store.load_note(id).await?,
        };
        self.adopt(&note);
        Ok(())
    }

    fn adopt(&self, note: &Note) {
        self.store.set_active(Some(&note.id));
        let mut inner = self.lock();
        inner.view = Some(EditorView::from_note(note));
        inner
            .breadcrumbs
            .on_activated(&note.id, note.parent_id.as_deref());
    }

    /// Escape key: save and close, unless a popover takes the key.
    /// Returns whether the editor was closed.
    pub async fn escape(&self) -> Result<bool> {
        if self.lock().popover_open {
            return Ok(false);
        }
        self.select(None).await?;
        Ok(true)
    }

    /// Drill from the current note into one of its subtasks.
    pub async fn open_subtask(&self, subtask_id: &str) -> Result<()> {
        let Some(current_id) = self.note_id() else {
            tracing::debug!("No note open, cannot open subtask {}", subtask_id);
            return Ok(());
        };
        let _ = self.flush().await;

        let subtask = match self.store.load_note(subtask_id).await {
            Ok(note) => note,
            Err(e) => {
                tracing::warn!("Failed to load subtask {}: {}", subtask_id, e);
                self.store.get(subtask_id).ok_or(e)?
            }
        };

        // Pushed only once the subtask is there to be shown
        let title = match self.store.get(&current_id) {
            Some(note) => note.title,
            None => self.view().map(|v| v.title).unwrap_or_default(),
        };
        self.lock().breadcrumbs.push(&current_id, &title);
        self.adopt(&subtask);
        Ok(())
    }

    /// Jump back to an ancestor shown in the breadcrumb trail.
    pub async fn navigate_breadcrumb(&self, id: &str) -> Result<()> {
        self.lock().breadcrumbs.truncate_to(id);
        self.select(Some(id)).await
    }

    // ===== History =====

    pub fn toggle_history(&self) -> bool {
        let mut inner = self.lock();
        match inner.view.as_mut() {
            Some(view) => {
                view.history_open = !view.history_open;
                view.history_open
            }
            None => false,
        }
    }

    fn require_note(&self) -> Result<String> {
        self.note_id()
            .ok_or_else(|| AppError::Generic("No note is open".to_string()))
    }

    pub async fn list_versions(&self) -> Result<Vec<NoteVersionBrief>> {
        let note_id = self.require_note()?;
        self.versions.list(&note_id).await
    }

    pub async fn preview_version(&self, version_id: &str) -> Result<NoteVersion> {
        let note_id = self.require_note()?;
        self.versions.get(&note_id, version_id).await
    }

    /// Restore a version into the open note and show the restored text.
    pub async fn restore_version(&self, version_id: &str) -> Result<Note> {
        let note_id = self.require_note()?;
        let _ = self.flush().await;

        let note = self.versions.restore(&note_id, version_id).await?;

        let mut inner = self.lock();
        if let Some(view) = inner.view.as_mut().filter(|v| v.note_id == note_id) {
            view.title = note.title.clone();
            view.content = note.content.clone();
            view.dirty = false;
            view.history_open = false;
        }
        Ok(note)
    }

    // ===== Lifecycle actions =====

    pub async fn trash_active(&self) -> Result<()> {
        let note_id = self.require_note()?;
        let _ = self.flush().await;
        let result = self.store.trash(&note_id).await;
        self.sync_selection();
        result
    }

    pub async fn complete_active(&self) -> Result<Note> {
        let note_id = self.require_note()?;
        let _ = self.flush().await;
        let result = self.store.complete(&note_id).await;
        self.sync_selection();
        result
    }

    /// Close the view if the store no longer has it selected.
    fn sync_selection(&self) {
        let active = self.store.active_note_id();
        let mut inner = self.lock();
        if inner.view.as_ref().map(|v| &v.note_id) != active.as_ref() {
            inner.view = None;
        }
    }

    // ===== Background =====

    /// Start the task that saves once the quiet period is over.
    ///
    /// The task holds only a weak reference and stops when the session
    /// is closed or dropped.
    pub fn spawn_autosave(self: &Arc<Self>) -> JoinHandle<()> {
        let session = Arc::downgrade(self);
        let wake = self.wake.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            tracing::debug!("Autosave driver started");
            loop {
                let delay = match session.upgrade() {
                    Some(s) => s
                        .next_deadline()
                        .map(|deadline| deadline.saturating_duration_since(s.clock.now())),
                    None => break,
                };
                let sleep = async move {
                    match delay {
                        Some(delay) => tokio::time::sleep(delay).await,
                        None => std::future::pending::<()>().await,
                    }
                };

                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = wake.notified() => continue,
                    () = sleep => {
                        let Some(s) = session.upgrade() else { break };
                        if let Err(e) = s.tick().await {
                            tracing::debug!("Timed save failed: {}", e);
                        }
                    }
                }
            }
            tracing::debug!("Autosave driver stopped");
        })
    }

    /// Stop the driver and hand any pending edit to the task queue.
    pub fn close(&self) {
        self.cancel.cancel();

        let edit = self.lock().scheduler.flush();
        if let Some(edit) = edit {
            tracing::info!("Editor closing with unsaved edit to note {}", edit.note_id);
            let store = self.store.clone();
            self.tasks.dispatch("save on close", async move {
                store.save_text(&edit).await.map(|_| ())
            });
        }
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::Operation;
    use crate::api::{InMemoryBackend, NoteCreate, NoteQuery, NoteUpdate, NotesBackend};
    use crate::services::clock::ManualClock;

    struct Fixture {
        backend: Arc<InMemoryBackend>,
        store: Arc<NoteStore>,
        clock: Arc<ManualClock>,
        tasks: TaskQueue,
    }

    impl Fixture {
        async fn new() -> Self {
            let backend = Arc::new(InMemoryBackend::new());
            Self {
                store: Arc::new(NoteStore::new(backend.clone())),
                backend,
                clock: Arc::new(ManualClock::new()),
                tasks: TaskQueue::current().unwrap(),
            }
        }

        fn editor(&self) -> EditorSession {
            EditorSession::new(
                self.store.clone(),
                self.tasks.clone(),
                self.clock.clone(),
                EditorOptions::default(),
            )
        }

        async fn note(&self, title: &str, content: &str) -> Note {
            let mut data = NoteCreate::titled(title);
            data.content = content.to_string();
            self.store.create_note(data).await.unwrap()
        }

        fn updates(&self) -> Vec<NoteUpdate> {
            self.backend
                .calls_of(Operation::UpdateNote)
                .into_iter()
                .filter_map(|c| c.update)
                .collect()
        }
    }

    #[tokio::test]
    async fn test_only_last_snapshot_is_sent() {
        let fx = Fixture::new().await;
        let note = fx.note("", "").await;
        let editor = fx.editor();
        editor.select(Some(&note.id)).await.unwrap();

        for title in ["G", "Gr", "Gro", "Groceries"] {
            editor.edit_title(title);
            fx.clock.advance(Duration::from_millis(300));
            editor.tick().await.unwrap();
        }
        assert!(fx.updates().is_empty());

        fx.clock.advance(Duration::from_millis(1000));
        editor.tick().await.unwrap();

        let updates = fx.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].title.as_deref(), Some("Groceries"));
    }

    #[tokio::test]
    async fn test_switching_notes_saves_previous_note_first() {
        let fx = Fixture::new().await;
        let a = fx.note("A", "alpha").await;
        let b = fx.note("B", "beta").await;
        let editor = fx.editor();
        editor.select(Some(&a.id)).await.unwrap();

        editor.edit_content("alpha, edited");
        editor.select(Some(&b.id)).await.unwrap();

        let calls = fx.backend.calls_of(Operation::UpdateNote);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].target.as_deref(), Some(a.id.as_str()));
        assert_eq!(
            calls[0].update.as_ref().and_then(|u| u.content.as_deref()),
            Some("alpha, edited")
        );

        let view = editor.view().unwrap();
        assert_eq!(view.note_id, b.id);
        assert_eq!(view.title, "B");
        assert_eq!(view.content, "beta");
        assert!(!view.dirty);
        assert!(editor.pending_edit().is_none());
    }

    #[tokio::test]
    async fn test_double_flush_sends_once() {
        let fx = Fixture::new().await;
        let note = fx.note("A", "").await;
        let editor = fx.editor();
        editor.select(Some(&note.id)).await.unwrap();

        editor.edit_title("A2");
        editor.flush().await.unwrap();
        editor.flush().await.unwrap();

        assert_eq!(fx.updates().len(), 1);
    }

    #[tokio::test]
    async fn test_successful_save_clears_dirty_and_shows_saved() {
        let fx = Fixture::new().await;
        let note = fx.note("A", "").await;
        let editor = fx.editor();
        editor.select(Some(&note.id)).await.unwrap();

        editor.edit_title("A2");
        assert!(editor.view().unwrap().dirty);

        editor.save_now().await.unwrap();
        let view = editor.view().unwrap();
        assert!(!view.dirty);
        assert!(!view.saving);
        assert!(editor.is_just_saved());

        fx.clock.advance(Duration::from_millis(1600));
        assert!(!editor.is_just_saved());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_dirty_and_drops_edit() {
        let fx = Fixture::new().await;
        let note = fx.note("A", "").await;
        let editor = fx.editor();
        editor.select(Some(&note.id)).await.unwrap();

        fx.backend.fail_next(Operation::UpdateNote);
        editor.edit_title("lost");
        assert!(editor.save_now().await.is_err());

        assert!(editor.view().unwrap().dirty);
        assert!(editor.pending_edit().is_none());
        assert_eq!(fx.backend.snapshot(&note.id).unwrap().title, "A");
    }

    #[tokio::test]
    async fn test_escape_respects_popover() {
        let fx = Fixture::new().await;
        let note = fx.note("A", "").await;
        let editor = fx.editor();
        editor.select(Some(&note.id)).await.unwrap();
        editor.edit_title("A2");

        editor.set_popover_open(true);
        assert!(!editor.escape().await.unwrap());
        assert!(editor.view().is_some());
        assert!(fx.updates().is_empty());

        editor.set_popover_open(false);
        assert!(editor.escape().await.unwrap());
        assert!(editor.view().is_none());
        assert_eq!(fx.store.active_note_id(), None);
        assert_eq!(fx.updates().len(), 1);
    }

    #[tokio::test]
    async fn test_breadcrumb_navigation_truncates_and_activates() {
        let fx = Fixture::new().await;
        let a = fx.note("A", "").await;
        let b = fx.store.create_subtask(&a.id, "B").await.unwrap();
        let editor = fx.editor();
        editor.select(Some(&a.id)).await.unwrap();

        editor.open_subtask(&b.id).await.unwrap();
        assert_eq!(editor.note_id(), Some(b.id.clone()));
        assert_eq!(
            editor.breadcrumbs(),
            vec![Crumb {
                id: a.id.clone(),
                title: "A".to_string()
            }]
        );

        editor.navigate_breadcrumb(&a.id).await.unwrap();
        assert!(editor.breadcrumbs().is_empty());
        assert_eq!(fx.store.active_note_id(), Some(a.id.clone()));
        assert_eq!(editor.view().unwrap().title, "A");
    }

    #[tokio::test]
    async fn test_failed_subtask_load_leaves_trail_alone() {
        let fx = Fixture::new().await;
        let a = fx.note("A", "").await;
        let b = fx
            .backend
            .create_note(&NoteCreate::subtask(&a.id, "B"))
            .await
            .unwrap();
        let editor = fx.editor();
        editor.select(Some(&a.id)).await.unwrap();

        fx.backend.fail_next(Operation::GetNote);
        assert!(editor.open_subtask(&b.id).await.is_err());

        assert!(editor.breadcrumbs().is_empty());
        assert_eq!(editor.note_id(), Some(a.id.clone()));
        assert_eq!(fx.store.active_note_id(), Some(a.id));
    }

    #[tokio::test]
    async fn test_selecting_unrelated_note_resets_breadcrumbs() {
        let fx = Fixture::new().await;
        let a = fx.note("A", "").await;
        let other = fx.note("Other", "").await;
        let b = fx.store.create_subtask(&a.id, "B").await.unwrap();
        let editor = fx.editor();
        editor.select(Some(&a.id)).await.unwrap();
        editor.open_subtask(&b.id).await.unwrap();

        editor.select(Some(&other.id)).await.unwrap();

        assert!(editor.breadcrumbs().is_empty());
    }

    #[tokio::test]
    async fn test_restore_version_resyncs_view() {
        let fx = Fixture::new().await;
        let note = fx.note("X", "Y").await;
        fx.backend
            .update_note(&note.id, &NoteUpdate::text("Now", "current"))
            .await
            .unwrap();
        fx.store.refresh(NoteQuery::default()).await.unwrap();

        let editor = fx.editor();
        editor.select(Some(&note.id)).await.unwrap();
        assert!(editor.toggle_history());
        let version = editor.list_versions().await.unwrap().remove(0);
        assert_eq!(editor.preview_version(&version.id).await.unwrap().content, "Y");

        editor.restore_version(&version.id).await.unwrap();

        let view = editor.view().unwrap();
        assert_eq!(view.title, "X");
        assert_eq!(view.content, "Y");
        assert!(!view.dirty);
        assert!(!view.history_open);
    }

    #[tokio::test]
    async fn test_trash_active_closes_view() {
        let fx = Fixture::new().await;
        let note = fx.note("A", "").await;
        let editor = fx.editor();
        editor.select(Some(&note.id)).await.unwrap();

        editor.trash_active().await.unwrap();

        assert!(editor.view().is_none());
        assert!(fx.store.get(&note.id).is_none());
    }

    #[tokio::test]
    async fn test_complete_closes_view_even_if_refetch_fails() {
        let fx = Fixture::new().await;
        let mut data = NoteCreate::titled("Standup");
        data.recurrence_rule = Some(crate::api::RecurrenceRule::new(
            crate::api::Frequency::Weekly,
            1,
        ));
        let note = fx.store.create_note(data).await.unwrap();
        let editor = fx.editor();
        editor.select(Some(&note.id)).await.unwrap();

        fx.backend.fail_next(Operation::ListNotes);
        let completed = editor.complete_active().await.unwrap();

        assert!(completed.is_completed);
        assert!(fx.backend.snapshot(&note.id).unwrap().is_completed);
        assert!(editor.view().is_none());
        assert_eq!(fx.store.active_note_id(), None);
    }

    #[tokio::test]
    async fn test_drop_dispatches_pending_save() {
        let fx = Fixture::new().await;
        let note = fx.note("A", "").await;
        let editor = fx.editor();
        editor.select(Some(&note.id)).await.unwrap();
        editor.edit_title("typed before close");

        drop(editor);
        fx.tasks.shutdown().await;

        assert_eq!(
            fx.backend.snapshot(&note.id).unwrap().title,
            "typed before close"
        );
    }

    #[tokio::test]
    async fn test_driver_saves_after_quiet_period() {
        let fx = Fixture::new().await;
        let note = fx.note("", "").await;
        let editor = Arc::new(EditorSession::new(
            fx.store.clone(),
            fx.tasks.clone(),
            Arc::new(crate::services::clock::SystemClock),
            EditorOptions {
                autosave_delay: Duration::from_millis(50),
                saved_indicator: Duration::from_millis(1500),
            },
        ));
        let driver = editor.spawn_autosave();
        editor.select(Some(&note.id)).await.unwrap();

        editor.edit_title("Groceries");
        tokio::time::sleep(Duration::from_millis(300)).await;

        let updates = fx.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].title.as_deref(), Some("Groceries"));
        assert!(!editor.view().unwrap().dirty);

        editor.close();
        driver.await.unwrap();
    }
}
