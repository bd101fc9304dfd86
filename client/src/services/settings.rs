//! Settings service
//!
//! Manages client settings persistence using JSON file storage.

use crate::config::{
    API_URL_ENV, DEFAULT_API_BASE_URL, DEFAULT_AUTO_SAVE_DELAY_MS, DEFAULT_REMINDER_POLL_SECS,
    MAX_AUTO_SAVE_DELAY_MS, MIN_AUTO_SAVE_DELAY_MS, SAVED_INDICATOR_MS, SETTINGS_FILE_NAME,
};
use crate::error::{AppError, Result};
use crate::services::editor::EditorOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

/// Client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    /// Base URL of the notes API, including the `/api` prefix
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Auto-save delay in milliseconds (minimum 100ms)
    #[serde(default = "default_auto_save_delay")]
    pub auto_save_delay: u32,
    /// How long the "Saved" confirmation shows, in milliseconds
    #[serde(default = "default_saved_indicator")]
    pub saved_indicator: u32,
    #[serde(default = "default_reminder_poll_secs")]
    pub reminder_poll_secs: u64,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_auto_save_delay() -> u32 {
    DEFAULT_AUTO_SAVE_DELAY_MS
}

fn default_saved_indicator() -> u32 {
    SAVED_INDICATOR_MS
}

fn default_reminder_poll_secs() -> u64 {
    DEFAULT_REMINDER_POLL_SECS
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            auto_save_delay: default_auto_save_delay(),
            saved_indicator: default_saved_indicator(),
            reminder_poll_secs: default_reminder_poll_secs(),
        }
    }
}

impl AppSettings {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_AUTO_SAVE_DELAY_MS..=MAX_AUTO_SAVE_DELAY_MS).contains(&self.auto_save_delay) {
            return Err(AppError::Settings(format!(
                "Auto-save delay must be between {} and {} ms, got {}",
                MIN_AUTO_SAVE_DELAY_MS, MAX_AUTO_SAVE_DELAY_MS, self.auto_save_delay
            )));
        }
        if self.reminder_poll_secs == 0 {
            return Err(AppError::Settings(
                "Reminder poll interval must be at least 1 second".to_string(),
            ));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(AppError::Settings("API base URL is empty".to_string()));
        }
        Ok(())
    }

    pub fn editor_options(&self) -> EditorOptions {
        EditorOptions {
            autosave_delay: Duration::from_millis(u64::from(self.auto_save_delay)),
            saved_indicator: Duration::from_millis(u64::from(self.saved_indicator)),
        }
    }

    pub fn reminder_poll_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_poll_secs)
    }

    /// Apply `EVERYNOTE_API_URL` if it is set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            self = self.with_api_url_override(Some(url));
        }
        self
    }

    fn with_api_url_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            tracing::info!("API base URL overridden by {}: {}", API_URL_ENV, url);
            self.api_base_url = url;
        }
        self
    }
}

/// Service for managing client settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            settings_path: data_dir.join(SETTINGS_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<AppSettings> {
        if !fs::try_exists(&self.settings_path).await? {
            tracing::info!("Settings file not found, creating default settings");
            let default = AppSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: AppSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Settings(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &AppSettings) -> Result<()> {
        settings.validate()?;

        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    /// Update the auto-save delay
    pub async fn update_auto_save_delay(&self, delay_ms: u32) -> Result<AppSettings> {
        let mut settings = self.load().await?;
        settings.auto_save_delay = delay_ms;
        self.save(&settings).await?;
        Ok(settings)
    }

    /// Update the API base URL
    pub async fn update_api_base_url(&self, url: &str) -> Result<AppSettings> {
        let mut settings = self.load().await?;
        settings.api_base_url = url.trim().to_string();
        self.save(&settings).await?;
        Ok(settings)
    }
}
