//! REST client for the notes API

use super::models::*;
use super::NotesBackend;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// `NotesBackend` over HTTP. Cloning shares the connection pool.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

/// FastAPI error body; `detail` is a string or a list of validation errors.
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status, &body))
    }

    async fn send_ack(&self, request: RequestBuilder) -> Result<()> {
        let _: Ack = self.send(request).await?;
        Ok(())
    }
}

fn error_from_response(status: StatusCode, body: &str) -> AppError {
    let message = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) if body.is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body.to_string(),
    };

    if status == StatusCode::NOT_FOUND {
        AppError::NotFound(message)
    } else {
        AppError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl NotesBackend for HttpBackend {
    async fn list_notes(&self, query: &NoteQuery) -> Result<Vec<Note>> {
        self.send(self.client.get(self.url("/notes")).query(query))
            .await
    }

    async fn get_note(&self, id: &str) -> Result<Note> {
        self.send(self.client.get(self.url(&format!("/notes/{id}"))))
            .await
    }

    async fn create_note(&self, data: &NoteCreate) -> Result<Note> {
        self.send(self.client.post(self.url("/notes")).json(data))
            .await
    }

    async fn update_note(&self, id: &str, update: &NoteUpdate) -> Result<Note> {
        self.send(
            self.client
                .patch(self.url(&format!("/notes/{id}")))
                .json(update),
        )
        .await
    }

    async fn delete_note(&self, id: &str, permanent: bool) -> Result<()> {
        self.send_ack(
            self.client
                .delete(self.url(&format!("/notes/{id}")))
                .query(&[("permanent", permanent)]),
        )
        .await
    }

    async fn restore_note(&self, id: &str) -> Result<Note> {
        self.send(self.client.post(self.url(&format!("/notes/{id}/restore"))))
            .await
    }

    async fn complete_note(&self, id: &str) -> Result<Note> {
        self.send(self.client.post(self.url(&format!("/notes/{id}/complete"))))
            .await
    }

    async fn uncomplete_note(&self, id: &str) -> Result<Note> {
        self.send(
            self.client
                .post(self.url(&format!("/notes/{id}/uncomplete"))),
        )
        .await
    }

    async fn set_status(&self, id: &str, status: Option<NoteStatus>) -> Result<Note> {
        self.send(
            self.client
                .patch(self.url(&format!("/notes/{id}/status")))
                .json(&StatusUpdate { status }),
        )
        .await
    }

    async fn remove_recurrence(&self, id: &str) -> Result<Note> {
        self.send(
            self.client
                .delete(self.url(&format!("/notes/{id}/recurrence"))),
        )
        .await
    }

    async fn add_tag(&self, note_id: &str, tag_id: &str) -> Result<()> {
        self.send_ack(
            self.client
                .post(self.url(&format!("/notes/{note_id}/tags/{tag_id}"))),
        )
        .await
    }

    async fn remove_tag(&self, note_id: &str, tag_id: &str) -> Result<()> {
        self.send_ack(
            self.client
                .delete(self.url(&format!("/notes/{note_id}/tags/{tag_id}"))),
        )
        .await
    }

    async fn list_versions(&self, note_id: &str) -> Result<Vec<NoteVersionBrief>> {
        self.send(
            self.client
                .get(self.url(&format!("/notes/{note_id}/versions"))),
        )
        .await
    }

    async fn get_version(&self, note_id: &str, version_id: &str) -> Result<NoteVersion> {
        self.send(
            self.client
                .get(self.url(&format!("/notes/{note_id}/versions/{version_id}"))),
        )
        .await
    }

    async fn restore_version(&self, note_id: &str, version_id: &str) -> Result<Note> {
        self.send(self.client.post(self.url(&format!(
            "/notes/{note_id}/versions/{version_id}/restore"
        ))))
        .await
    }

    async fn list_subtasks(&self, note_id: &str) -> Result<Vec<Note>> {
        self.send(
            self.client
                .get(self.url(&format!("/notes/{note_id}/subtasks"))),
        )
        .await
    }

    async fn backlinks(&self, note_id: &str) -> Result<Vec<Backlink>> {
        self.send(
            self.client
                .get(self.url(&format!("/notes/{note_id}/backlinks"))),
        )
        .await
    }

    async fn reorder_notes(&self, items: &[ReorderItem]) -> Result<()> {
        let body = ReorderRequest {
            items: items.to_vec(),
        };
        self.send_ack(self.client.post(self.url("/notes/reorder")).json(&body))
            .await
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.send(self.client.get(self.url("/tags"))).await
    }

    async fn create_tag(&self, data: &TagCreate) -> Result<Tag> {
        self.send(self.client.post(self.url("/tags")).json(data))
            .await
    }

    async fn create_reminder(&self, note_id: &str, remind_at: DateTime<Utc>) -> Result<Reminder> {
        self.send(
            self.client
                .post(self.url(&format!("/notes/{note_id}/reminders")))
                .json(&serde_json::json!({ "remind_at": remind_at })),
        )
        .await
    }

    async fn pending_reminders(&self) -> Result<Vec<PendingReminder>> {
        self.send(self.client.get(self.url("/reminders/pending")))
            .await
    }

    async fn fire_reminder(&self, id: &str) -> Result<Reminder> {
        self.send(self.client.post(self.url(&format!("/reminders/{id}/fire"))))
            .await
    }

    async fn dismiss_reminder(&self, id: &str) -> Result<Reminder> {
        self.send(
            self.client
                .post(self.url(&format!("/reminders/{id}/dismiss"))),
        )
        .await
    }

    async fn snooze_reminder(&self, id: &str, minutes: u32) -> Result<Reminder> {
        self.send(
            self.client
                .post(self.url(&format!("/reminders/{id}/snooze")))
                .json(&serde_json::json!({ "minutes": minutes })),
        )
        .await
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<SearchResult>> {
        self.send(
            self.client
                .get(self.url("/search"))
                .query(&[("q", query.to_string()), ("limit", limit.to_string())]),
        )
        .await
    }

    async fn list_attachments(&self, note_id: &str) -> Result<Vec<Attachment>> {
        self.send(
            self.client
                .get(self.url(&format!("/notes/{note_id}/attachments"))),
        )
        .await
    }

    async fn upload_attachment(&self, note_id: &str, upload: &AttachmentUpload) -> Result<Attachment> {
        let part = Part::bytes(upload.data.clone())
            .file_name(upload.filename.clone())
            .mime_str(&upload.mime_type)?;
        self.send(
            self.client
                .post(self.url(&format!("/notes/{note_id}/attachments")))
                .multipart(Form::new().part("file", part)),
        )
        .await
    }

    async fn attachment_data(&self, id: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.url(&format!("/attachments/{id}/file")))
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.bytes().await?.to_vec());
        }

        let body = response.text().await.unwrap_or_default();
        Err(error_from_response(status, &body))
    }

    async fn delete_attachment(&self, id: &str) -> Result<()> {
        self.send_ack(self.client.delete(self.url(&format!("/attachments/{id}"))))
            .await
    }
}
