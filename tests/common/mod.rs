#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use social_blog::{
    app_state::AppState,
    config::Config,
    entities::{EntGroup, EntPost, EntSession, EntUser, NewGroup, NewPost},
    infrastructure::database::BlogDatabase,
    routes::create_app_router,
};

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub media: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let media = tempfile::tempdir().unwrap();
        let mut config = Config::for_testing(media.path());
        adjust(&mut config);
        let db = BlogDatabase::in_memory().await.unwrap();
        let state = AppState::with_database(config, Arc::new(db));
        let router = create_app_router(state.clone());
        Self { state, router, media }
    }

    /// Accounts made here carry a placeholder hash; log in with `login`.
    pub async fn user(&self, username: &str) -> EntUser {
        EntUser::create(&self.state.db, username, "not-a-real-hash").await.unwrap()
    }

    pub async fn group(&self, title: &str, slug: &str) -> EntGroup {
        EntGroup::create(
            &self.state.db,
            NewGroup {
                title: title.to_string(),
                slug: slug.to_string(),
                description: String::new(),
            },
        )
        .await
        .unwrap()
    }

    pub async fn post(&self, author: &EntUser, text: &str, group: Option<&EntGroup>) -> EntPost {
        EntPost::create(
            &self.state.db,
            NewPost {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|group| group.id),
                image: None,
            },
        )
        .await
        .unwrap()
    }

    /// Cookie header value for a fresh session of `user`.
    pub async fn login(&self, user: &EntUser) -> String {
        let session = EntSession::create(&self.state.db, user.id, self.state.session_ttl())
            .await
            .unwrap();
        format!("sessionid={}", session.token)
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }
}

const BOUNDARY: &str = "socialblogboundary";

/// `multipart/form-data` POST with text fields and an optional `image` file.
pub fn multipart_post(
    uri: &str,
    cookie: &str,
    fields: &[(&str, &str)],
    file: Option<(&str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Asserts a 200 page and returns `(template, context)`.
pub async fn page(response: Response) -> (String, Value) {
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    (body["template"].as_str().unwrap().to_string(), body["context"].clone())
}

pub fn location(response: &Response) -> &str {
    response.headers().get(header::LOCATION).unwrap().to_str().unwrap()
}

pub fn post_texts(page: &Value) -> Vec<String> {
    page["object_list"]
        .as_array()
        .unwrap()
        .iter()
        .map(|post| post["text"].as_str().unwrap().to_string())
        .collect()
}
