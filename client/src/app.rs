//! Application state and initialization
//!
//! This module manages the central application state and lifecycle.
//! All services are initialized here and made available through AppState.

use crate::api::{HttpBackend, NotesBackend};
use crate::error::Result;
use crate::services::{
    AppSettings, AttachmentsService, Clock, EditorSession, NoteStore, RemindersService, SettingsService, SystemClock,
    TagStore, TaskQueue, VersionService,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub data_dir: PathBuf,
    pub settings: AppSettings,
    pub settings_service: SettingsService,
    pub backend: Arc<dyn NotesBackend>,
    pub notes: Arc<NoteStore>,
    pub tags: Arc<TagStore>,
    pub attachments: AttachmentsService,
    pub versions: VersionService,
    pub reminders: Arc<RemindersService>,
    pub tasks: TaskQueue,
    pub clock: Arc<dyn Clock>,
    shutdown: CancellationToken,
}

impl AppState {
    /// Wire every service around one backend. Must run inside a tokio runtime.
    pub fn with_backend(
        data_dir: &Path,
        settings: AppSettings,
        backend: Arc<dyn NotesBackend>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let notes = Arc::new(NoteStore::new(backend.clone()));

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            settings_service: SettingsService::new(data_dir),
            settings,
            tags: Arc::new(TagStore::new(backend.clone())),
            attachments: AttachmentsService::new(backend.clone()),
            versions: VersionService::new(notes.clone()),
            reminders: Arc::new(RemindersService::new(backend.clone(), clock.clone())),
            tasks: TaskQueue::current()?,
            notes,
            backend,
            clock,
            shutdown: CancellationToken::new(),
        })
    }

    /// Open an editor with its autosave driver running.
    pub fn editor(&self) -> Arc<EditorSession> {
        let session = Arc::new(EditorSession::new(
            self.notes.clone(),
            self.tasks.clone(),
            self.clock.clone(),
            self.settings.editor_options(),
        ));
        session.spawn_autosave();
        session
    }

    /// Start polling reminders until shutdown.
    pub fn start_reminders(&self) -> JoinHandle<()> {
        self.reminders.clone().start_scheduler(
            self.settings.reminder_poll_interval(),
            self.shutdown.child_token(),
        )
    }

    /// Stop schedulers and wait for background saves.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down");
        self.shutdown.cancel();
        self.tasks.shutdown().await;
    }
}

/// Application setup - called once on startup
pub async fn setup(data_dir: &Path) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", data_dir);

    tokio::fs::create_dir_all(data_dir).await?;

    let settings = SettingsService::new(data_dir)
        .load()
        .await?
        .with_env_overrides();
    settings.validate()?;

    let backend = Arc::new(HttpBackend::new(&settings.api_base_url)?);
    tracing::info!("Using API at {}", backend.base_url());

    let state = AppState::with_backend(data_dir, settings, backend, Arc::new(SystemClock))?;

    tracing::info!("Application initialized successfully");

    Ok(state)
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "everynote=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
