//! Lendly Library Circulation Server
//!
//! A REST JSON API for managing a library's books and members and for
//! lending copies out: borrowing, returning and overdue detection.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
