// ViewerContext Middleware - resolves the session cookie into a request-scoped viewer
// and injects it into request extensions for the extractors.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    entities::EntSession,
    error::AppError,
    infrastructure::viewer::ViewerContext,
};

pub const SESSION_COOKIE: &str = "sessionid";

pub async fn viewer_context_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let request_id = Uuid::new_v4().to_string();
    let jar = CookieJar::from_headers(request.headers());

    let viewer_context = match jar.get(SESSION_COOKIE).map(|cookie| cookie.value().to_string()) {
        Some(token) => match EntSession::gen_user(&app_state.db, &token).await? {
            Some(user) => {
                debug!(request_id = %request_id, user = %user.username, "Authenticated request");
                ViewerContext::authenticated(request_id, user, token)
            }
            None => ViewerContext::anonymous(request_id),
        },
        None => ViewerContext::anonymous(request_id),
    };

    request.extensions_mut().insert(Arc::new(viewer_context));
    Ok(next.run(request).await)
}
