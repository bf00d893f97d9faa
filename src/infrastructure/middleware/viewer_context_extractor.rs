// ViewerContext extractors for handlers
// `Vc` is any viewer, `LoggedIn` turns anonymous requests into a login redirect.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{request::Parts, StatusCode},
};
use std::sync::Arc;

use crate::entities::EntUser;
use crate::error::AppError;
use crate::infrastructure::viewer::ViewerContext;
use crate::render::path_and_query;

/// Cheap-to-clone handle on the request's `ViewerContext`.
#[derive(Debug, Clone)]
pub struct Vc(Arc<ViewerContext>);

impl std::ops::Deref for Vc {
    type Target = ViewerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Vc
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Missing means the middleware was not installed on this route.
        parts
            .extensions
            .get::<Arc<ViewerContext>>()
            .map(|vc| Vc(vc.clone()))
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// The authenticated user, or a redirect to the login page that returns
/// to the requested URL afterwards.
#[derive(Debug, Clone)]
pub struct LoggedIn {
    pub user: EntUser,
    pub vc: Vc,
}

impl std::ops::Deref for LoggedIn {
    type Target = EntUser;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

impl<S> FromRequestParts<S> for LoggedIn
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let vc = Vc::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::Internal("viewer context missing".to_string()))?;

        match vc.user.clone() {
            Some(user) => Ok(LoggedIn { user, vc }),
            None => {
                let uri = parts
                    .extensions
                    .get::<OriginalUri>()
                    .map(|original| original.0.clone())
                    .unwrap_or_else(|| parts.uri.clone());
                Err(AppError::Unauthenticated {
                    next: path_and_query(&uri),
                })
            }
        }
    }
}
