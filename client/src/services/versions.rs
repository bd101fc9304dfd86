//! Version history
//!
//! Versions are captured by the server when a note's title or content
//! changes. Restoring copies a version forward into the live note; no
//! version is ever removed by it.

use crate::api::{Note, NoteVersion, NoteVersionBrief};
use crate::error::Result;
use crate::services::notes::NoteStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct VersionService {
    store: Arc<NoteStore>,
}

impl VersionService {
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self { store }
    }

    /// Versions of a note, newest first.
    pub async fn list(&self, note_id: &str) -> Result<Vec<NoteVersionBrief>> {
        self.store.backend().list_versions(note_id).await
    }

    pub async fn get(&self, note_id: &str, version_id: &str) -> Result<NoteVersion> {
        self.store.backend().get_version(note_id, version_id).await
    }

    /// Restore a version and return the refreshed record.
    ///
    /// The whole list is fetched again so every derived field comes from
    /// the server. Notes outside the list (subtasks) keep the record the
    /// restore call returned.
    pub async fn restore(&self, note_id: &str, version_id: &str) -> Result<Note> {
        tracing::info!("Restoring version {} of note {}", version_id, note_id);

        let restored = self
            .store
            .backend()
            .restore_version(note_id, version_id)
            .await?;

        self.store.reload().await?;

        if let Some(note) = self.store.notes().into_iter().find(|n| n.id == note_id) {
            return Ok(note);
        }
        self.store.upsert(restored.clone());
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{InMemoryBackend, NoteCreate, NoteQuery, NoteUpdate, NotesBackend};

    async fn create_test_service() -> (VersionService, Arc<NoteStore>, Arc<InMemoryBackend>) {
        let backend = Arc::new(InMemoryBackend::new());
        let store = Arc::new(NoteStore::new(backend.clone()));
        (VersionService::new(store.clone()), store, backend)
    }

    #[tokio::test]
    async fn test_restore_round_trip_keeps_history() {
        let (service, store, backend) = create_test_service().await;
        let note = store.create_note(NoteCreate::titled("X")).await.unwrap();
        backend
            .update_note(&note.id, &NoteUpdate::text("X", "Y"))
            .await
            .unwrap();
        backend
            .update_note(&note.id, &NoteUpdate::text("Later", "changed"))
            .await
            .unwrap();
        backend
            .update_note(&note.id, &NoteUpdate::text("Latest", "changed again"))
            .await
            .unwrap();
        store.refresh(NoteQuery::default()).await.unwrap();

        let before = service.list(&note.id).await.unwrap();
        // newest first: "Later", "X"/"Y", "X"/""
        let target = before[1].clone();
        let newer = before[0].clone();
        assert_eq!(service.get(&note.id, &target.id).await.unwrap().content, "Y");

        let restored = service.restore(&note.id, &target.id).await.unwrap();

        assert_eq!(restored.title, "X");
        assert_eq!(restored.content, "Y");
        assert_eq!(store.get(&note.id).unwrap().content, "Y");

        let after = service.list(&note.id).await.unwrap();
        assert!(after.contains(&target));
        assert!(after.contains(&newer));
        assert_eq!(after.len(), before.len() + 1);
    }

    #[tokio::test]
    async fn test_restore_refetches_list() {
        let (service, store, backend) = create_test_service().await;
        let note = store.create_note(NoteCreate::titled("A")).await.unwrap();
        backend
            .update_note(&note.id, &NoteUpdate::text("B", ""))
            .await
            .unwrap();
        let version = service.list(&note.id).await.unwrap().remove(0);
        backend.clear_calls();

        service.restore(&note.id, &version.id).await.unwrap();

        let ops: Vec<_> = backend.calls().into_iter().map(|c| c.op).collect();
        assert_eq!(
            ops,
            vec![
                crate::api::memory::Operation::RestoreVersion,
                crate::api::memory::Operation::ListNotes,
            ]
        );
    }

    #[tokio::test]
    async fn test_restore_subtask_outside_list() {
        let (service, store, backend) = create_test_service().await;
        let parent = store.create_note(NoteCreate::titled("Parent")).await.unwrap();
        let child = store.create_subtask(&parent.id, "first").await.unwrap();
        backend
            .update_note(&child.id, &NoteUpdate::text("second", ""))
            .await
            .unwrap();
        let version = service.list(&child.id).await.unwrap().remove(0);

        let restored = service.restore(&child.id, &version.id).await.unwrap();

        assert_eq!(restored.title, "first");
        assert_eq!(store.get(&child.id).unwrap().title, "first");
    }
}
