//! Libris - Book and Author Catalog
//!
//! A REST JSON API for managing a catalog of authors and their books.
//! Reads are public; writes require a session established through
//! Google sign-in.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod validation;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    /// Backing store for the session layer
    pub session_store: services::sessions::AppSessionStore,
}
