use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

use crate::render;

#[derive(Debug)]
pub enum AppError {
    Database(anyhow::Error),
    DatabaseError(String),
    NotFound(String),
    BadRequest(String),
    Internal(String),
    Validation(String),
    /// Protected route hit without a session. `next` is the path (and query)
    /// the login page sends the user back to.
    Unauthenticated { next: String },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Database(err) => write!(f, "Database error: {}", err),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::Unauthenticated { next } => {
                write!(f, "Authentication required for {}", next)
            }
        }
    }
}

impl std::error::Error for AppError {}

/// Marker left on 404 responses so the error page layer can fill in the
/// request path.
#[derive(Debug, Clone)]
pub struct NotFoundPage;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                let mut response = render::not_found_page("").into_response();
                response.extensions_mut().insert(NotFoundPage);
                response
            }
            AppError::Unauthenticated { next } => render::login_redirect(&next),
            AppError::Database(err) => {
                tracing::error!("Database error: {}", err);
                render::server_error_page().into_response()
            }
            AppError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                render::server_error_page().into_response()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                render::server_error_page().into_response()
            }
            AppError::BadRequest(msg) | AppError::Validation(msg) => {
                let status = StatusCode::BAD_REQUEST;
                let body = Json(json!({
                    "error": msg,
                    "status": status.as_u16()
                }));
                (status, body).into_response()
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Database(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Row not found".to_string()),
            other => AppError::DatabaseError(other.to_string()),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;

    #[test]
    fn test_not_found_is_404_with_marker() {
        let response = AppError::NotFound("post 7".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<NotFoundPage>().is_some());
    }

    #[test]
    fn test_unauthenticated_redirects_to_login() {
        let response = AppError::Unauthenticated {
            next: "/new/".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/auth/login/?next=/new/"
        );
    }

    #[test]
    fn test_database_errors_hide_details() {
        let response = AppError::DatabaseError("disk I/O error".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
