//! Attachments service
//!
//! Uploads files to notes and fetches them back. Type and size limits
//! are checked here first so an oversized file never leaves the machine;
//! the server enforces the same limits.

use crate::api::{Attachment, AttachmentUpload, NotesBackend};
use crate::config::{ALLOWED_ATTACHMENT_TYPES, ATTACHMENT_MAX_BYTES, MAX_FILENAME_LEN};
use crate::error::{AppError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Service for managing attachments
#[derive(Clone)]
pub struct AttachmentsService {
    backend: Arc<dyn NotesBackend>,
}

impl AttachmentsService {
    pub fn new(backend: Arc<dyn NotesBackend>) -> Self {
        Self { backend }
    }

    /// Upload binary data as an attachment of `note_id`
    pub async fn create_attachment(
        &self,
        note_id: &str,
        filename: &str,
        mime_type: &str,
        data: &[u8],
    ) -> Result<Attachment> {
        tracing::info!(
            "Creating attachment: {} for note: {} (size: {} bytes)",
            filename,
            note_id,
            data.len()
        );

        let safe_filename = sanitize_filename(filename);
        if safe_filename.is_empty() {
            return Err(AppError::Generic("Attachment needs a filename".to_string()));
        }
        check_upload(mime_type, data.len())?;

        let upload = AttachmentUpload {
            filename: safe_filename,
            mime_type: mime_type.to_string(),
            data: data.to_vec(),
        };
        let attachment = self.backend.upload_attachment(note_id, &upload).await?;

        tracing::info!("Attachment created: {}", attachment.id);

        Ok(attachment)
    }

    pub async fn get_attachment_data(&self, attachment_id: &str) -> Result<Vec<u8>> {
        self.backend.attachment_data(attachment_id).await
    }

    /// List attachments for a note, newest first
    pub async fn list_attachments(&self, note_id: &str) -> Result<Vec<Attachment>> {
        self.backend.list_attachments(note_id).await
    }

    /// Write an attachment into `dir` under its original name.
    pub async fn save_to(&self, attachment: &Attachment, dir: &Path) -> Result<PathBuf> {
        let data = self.get_attachment_data(&attachment.id).await?;

        let mut name = sanitize_filename(&attachment.original_filename);
        if name.is_empty() {
            name = attachment.filename.clone();
        }
        let path = dir.join(name);

        tokio::fs::create_dir_all(dir).await?;
        tokio::fs::write(&path, data).await?;
        tracing::debug!("Attachment {} saved to {:?}", attachment.id, path);

        Ok(path)
    }

    pub async fn delete_attachment(&self, attachment_id: &str) -> Result<()> {
        tracing::info!("Deleting attachment: {}", attachment_id);
        self.backend.delete_attachment(attachment_id).await?;
        tracing::info!("Attachment deleted: {}", attachment_id);
        Ok(())
    }
}

fn check_upload(mime_type: &str, size: usize) -> Result<()> {
    if !ALLOWED_ATTACHMENT_TYPES.contains(&mime_type) {
        return Err(AppError::Generic(format!(
            "File type {} not allowed",
            mime_type
        )));
    }
    if size > ATTACHMENT_MAX_BYTES {
        return Err(AppError::Generic(format!(
            "File too large ({} bytes, max {} bytes)",
            size, ATTACHMENT_MAX_BYTES
        )));
    }
    Ok(())
}

/// Strip path separators and NUL so the name cannot escape a directory
fn sanitize_filename(filename: &str) -> String {
    filename
        .trim()
        .chars()
        .filter(|c| *c != '/' && *c != '\\' && *c != '\0')
        .take(MAX_FILENAME_LEN)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::Operation;
    use crate::api::{InMemoryBackend, NoteCreate};
    use tempfile::TempDir;

    async fn create_test_service() -> (AttachmentsService, Arc<InMemoryBackend>, String) {
        let backend = Arc::new(InMemoryBackend::new());
        let note = backend.create_note(&NoteCreate::titled("Test")).await.unwrap();
        (AttachmentsService::new(backend.clone()), backend, note.id)
    }

    #[tokio::test]
    async fn test_create_and_get_attachment() {
        let (service, _backend, note_id) = create_test_service().await;

        let attachment = service
            .create_attachment(&note_id, "notes.md", "text/markdown", b"# Hello")
            .await
            .unwrap();

        assert_eq!(attachment.note_id, note_id);
        assert_eq!(attachment.original_filename, "notes.md");
        assert_eq!(attachment.size_bytes, 7);
        assert_eq!(
            service.get_attachment_data(&attachment.id).await.unwrap(),
            b"# Hello"
        );
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("normal.txt"), "normal.txt");
        assert_eq!(sanitize_filename("../../../etc/passwd"), "..etcpasswd");
        assert_eq!(sanitize_filename("file\\name.txt"), "filename.txt");
        assert_eq!(sanitize_filename(&"x".repeat(300)).len(), MAX_FILENAME_LEN);
    }

    #[tokio::test]
    async fn test_rejected_files_never_uploaded() {
        let (service, backend, note_id) = create_test_service().await;

        let err = service
            .create_attachment(&note_id, "tool.exe", "application/octet-stream", b"MZ")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Generic(_)));

        let big = vec![0u8; ATTACHMENT_MAX_BYTES + 1];
        assert!(service
            .create_attachment(&note_id, "big.txt", "text/plain", &big)
            .await
            .is_err());

        assert!(service
            .create_attachment(&note_id, "//", "text/plain", b"x")
            .await
            .is_err());

        assert!(backend.calls_of(Operation::UploadAttachment).is_empty());
    }

    #[tokio::test]
    async fn test_list_and_delete_attachments() {
        let (service, _backend, note_id) = create_test_service().await;

        let first = service
            .create_attachment(&note_id, "file1.txt", "text/plain", b"data1")
            .await
            .unwrap();
        service
            .create_attachment(&note_id, "file2.txt", "text/plain", b"data2")
            .await
            .unwrap();
        assert_eq!(service.list_attachments(&note_id).await.unwrap().len(), 2);

        service.delete_attachment(&first.id).await.unwrap();

        let remaining = service.list_attachments(&note_id).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].original_filename, "file2.txt");
    }

    #[tokio::test]
    async fn test_save_to_uses_original_name() {
        let (service, _backend, note_id) = create_test_service().await;
        let temp = TempDir::new().unwrap();
        let attachment = service
            .create_attachment(&note_id, "report.csv", "text/csv", b"a,b\n1,2\n")
            .await
            .unwrap();

        let path = service
            .save_to(&attachment, &temp.path().join("downloads"))
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "report.csv");
        assert_eq!(std::fs::read(&path).unwrap(), b"a,b\n1,2\n");
    }
}
