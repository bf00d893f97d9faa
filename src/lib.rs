// Social blog - posts, groups, comments and follows over SQLite

pub mod app_state;
pub mod config;
pub mod entities;
pub mod error;
pub mod forms;
pub mod infrastructure;
pub mod paginator;
pub mod render;
pub mod routes;
pub mod views;

// Re-exports for convenience
pub use error::{AppError, AppResult};
