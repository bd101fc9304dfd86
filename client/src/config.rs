//! Application configuration constants
//!
//! Central location for defaults, resource limits and validation
//! boundaries used throughout the client.

// ===== Backend =====

/// Base URL of the notes API when neither settings nor environment set one
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";

/// Environment variable overriding the API base URL
pub const API_URL_ENV: &str = "EVERYNOTE_API_URL";

/// Environment variable selecting the data directory of the binary
pub const DATA_DIR_ENV: &str = "EVERYNOTE_DATA_DIR";

/// Name of the settings file inside the data directory
pub const SETTINGS_FILE_NAME: &str = "settings.json";

// ===== Autosave =====

/// Quiet period after the last keystroke before a save is issued.
pub const DEFAULT_AUTO_SAVE_DELAY_MS: u32 = 1000;

/// Minimum auto-save delay in milliseconds.
/// Values below this turn every keystroke into a request.
pub const MIN_AUTO_SAVE_DELAY_MS: u32 = 100;

/// Maximum auto-save delay in milliseconds (5 minutes).
/// Values above this widen the window in which an edit can be lost.
pub const MAX_AUTO_SAVE_DELAY_MS: u32 = 300_000;

/// How long the "Saved" confirmation stays visible after a save
pub const SAVED_INDICATOR_MS: u32 = 1500;

// ===== Ordering =====

/// Gap assumed after the last sibling when a note is dropped at the tail
pub const POSITION_TAIL_GAP: f64 = 2.0;

// ===== Reminders =====

/// Default interval between polls for pending reminders
pub const DEFAULT_REMINDER_POLL_SECS: u64 = 30;

/// Minutes a reminder is pushed back when snoozed without an explicit value
pub const DEFAULT_SNOOZE_MINUTES: u32 = 15;

// ===== Notes =====

/// Label shown for notes with an empty title
pub const UNTITLED: &str = "Untitled";

/// Maximum number of versions the server returns per note
pub const VERSION_LIST_LIMIT: usize = 50;

/// Default number of search results requested
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Color given to tags created without one
pub const DEFAULT_TAG_COLOR: &str = "#6366f1";

// ===== Attachments =====

/// Largest file the server accepts as an attachment (10 MB)
pub const ATTACHMENT_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Content types the server accepts as attachments
pub const ALLOWED_ATTACHMENT_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/svg+xml",
    "application/pdf",
    "text/plain",
    "text/markdown",
    "text/csv",
    "application/zip",
];

/// Longest filename kept when uploading
pub const MAX_FILENAME_LEN: usize = 255;
