//! Services module
//!
//! Business logic services that coordinate between the editor and the
//! notes API.

pub mod attachments;
pub mod autosave;
pub mod clock;
pub mod editor;
pub mod navigation;
pub mod notes;
pub mod optimistic;
pub mod ordering;
pub mod reminders;
pub mod settings;
pub mod tags;
pub mod tasks;
pub mod versions;

pub use attachments::AttachmentsService;
pub use autosave::{AutosaveScheduler, PendingEdit};
pub use clock::{Clock, ManualClock, SystemClock};
pub use editor::{EditorOptions, EditorSession, EditorView};
pub use navigation::{Breadcrumbs, Crumb};
pub use notes::NoteStore;
pub use reminders::{ReminderEvent, RemindersService};
pub use settings::{AppSettings, SettingsService};
pub use tags::TagStore;
pub use tasks::TaskQueue;
pub use versions::VersionService;
