use axum::{
    http::Uri,
    response::{IntoResponse, Response},
};
use std::any::Any;

use crate::{error::AppError, render};

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> Response {
    render::not_found_page(uri.path()).into_response()
}

/// Turns a handler panic into the 500 page.
pub fn panic_page(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(msg) = err.downcast_ref::<String>() {
        msg.clone()
    } else if let Some(msg) = err.downcast_ref::<&str>() {
        msg.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Handler panicked: {}", detail);
    render::server_error_page().into_response()
}

/// Missing file under `/media`; the error page layer fills in the path.
pub async fn missing_file() -> AppError {
    AppError::NotFound("media file".to_string())
}
