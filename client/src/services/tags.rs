//! Tags service
//!
//! Keeps the tag list with per-tag note counts. Attaching tags to notes
//! goes through `NoteStore::add_tag` / `remove_tag`.

use crate::api::{NotesBackend, Tag, TagCreate};
use crate::error::Result;
use std::sync::{Arc, PoisonError, RwLock};

pub struct TagStore {
    backend: Arc<dyn NotesBackend>,
    tags: RwLock<Vec<Tag>>,
}

impl TagStore {
    pub fn new(backend: Arc<dyn NotesBackend>) -> Self {
        Self {
            backend,
            tags: RwLock::new(Vec::new()),
        }
    }

    /// Cached tags, sorted by name.
    pub fn tags(&self) -> Vec<Tag> {
        self.tags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn find_by_name(&self, name: &str) -> Option<Tag> {
        self.tags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    pub async fn refresh(&self) -> Result<Vec<Tag>> {
        let tags = self.backend.list_tags().await?;
        tracing::debug!("Loaded {} tags", tags.len());
        *self.tags.write().unwrap_or_else(PoisonError::into_inner) = tags.clone();
        Ok(tags)
    }

    /// Create a tag. Without a color the server picks its default.
    pub async fn create(&self, name: &str, color: Option<&str>) -> Result<Tag> {
        tracing::info!("Creating tag {}", name);
        let data = TagCreate {
            name: name.trim().to_string(),
            color: color.map(str::to_string),
        };
        let tag = self.backend.create_tag(&data).await?;

        let mut tags = self.tags.write().unwrap_or_else(PoisonError::into_inner);
        tags.push(tag.clone());
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tag)
    }
}
