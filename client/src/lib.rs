//! Every Note client library
//!
//! Editing, autosave, version history and optimistic list updates for the
//! Every Note REST API. A UI layer drives `app::AppState` and the services
//! it holds.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod services;
pub mod templates;
pub mod wiki;
