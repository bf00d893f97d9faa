// Rendering layer - template name plus a serializable context
// Markup lives outside this service; the template name and context are the contract.

use axum::{
    extract::Request,
    http::{header, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;
use serde_json::json;

use crate::error::NotFoundPage;

pub const LOGIN_URL: &str = "/auth/login/";

/// Characters left literal in the `next` parameter.
const NEXT_PARAM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone)]
pub struct TemplateResponse<T> {
    template: &'static str,
    status: StatusCode,
    context: T,
}

#[derive(Serialize)]
struct RenderedPage<'a, T> {
    template: &'a str,
    context: &'a T,
}

impl<T: Serialize> TemplateResponse<T> {
    pub fn new(template: &'static str, context: T) -> Self {
        Self {
            template,
            status: StatusCode::OK,
            context,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

impl<T: Serialize> IntoResponse for TemplateResponse<T> {
    fn into_response(self) -> Response {
        let page = RenderedPage {
            template: self.template,
            context: &self.context,
        };
        (self.status, Json(page)).into_response()
    }
}

/// 302 Found to `location`.
pub fn redirect(location: impl AsRef<str>) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.as_ref().to_string())],
    )
        .into_response()
}

/// Characters left literal in a username path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'@')
    .remove(b'+');

pub fn profile_url(username: &str) -> String {
    format!("/{}/", utf8_percent_encode(username, PATH_SEGMENT))
}

pub fn post_url(username: &str, post_id: i64) -> String {
    format!("/{}/{}/", utf8_percent_encode(username, PATH_SEGMENT), post_id)
}

pub fn login_url(next: &str) -> String {
    format!("{}?next={}", LOGIN_URL, utf8_percent_encode(next, NEXT_PARAM))
}

pub fn login_redirect(next: &str) -> Response {
    redirect(login_url(next))
}

/// Path plus query, the form used for `next` parameters.
pub fn path_and_query(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

pub fn not_found_page(path: &str) -> TemplateResponse<serde_json::Value> {
    TemplateResponse::new("misc/404.html", json!({ "path": path }))
        .with_status(StatusCode::NOT_FOUND)
}

pub fn server_error_page() -> TemplateResponse<serde_json::Value> {
    TemplateResponse::new("misc/500.html", json!({}))
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)
}

/// Re-renders 404s raised by handlers so the page carries the request path.
pub async fn error_pages(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    if response.extensions().get::<NotFoundPage>().is_some() {
        return not_found_page(&path).into_response();
    }
    response
}
