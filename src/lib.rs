//! Roombook Booking Server
//!
//! Meeting rooms and movable equipment reservation service, exposing a REST
//! JSON API over a booking state machine, a conflict detector and a
//! natural-language booking assistant.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod scheduling;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
