// Page cache - whole-response caching keyed by request URL

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::app_state::AppState;
use crate::infrastructure::cache::Cache;
use crate::render::path_and_query;

#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub content_type: Option<HeaderValue>,
    pub body: Bytes,
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::OK, self.body).into_response();
        if let Some(content_type) = self.content_type {
            response.headers_mut().insert(header::CONTENT_TYPE, content_type);
        }
        response
    }
}

/// Storage behind the page cache.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<CachedResponse>;
    async fn put(&self, key: String, response: CachedResponse);
    async fn clear(&self);
}

/// In-process LRU with a per-entry time-to-live.
pub struct LruResponseCache {
    inner: Mutex<Cache<String, CachedResponse>>,
}

impl LruResponseCache {
    /// `None` when `capacity` is zero.
    pub fn new(capacity: usize, ttl: Duration) -> Option<Self> {
        Cache::new(capacity, ttl).map(|cache| Self {
            inner: Mutex::new(cache),
        })
    }
}

#[async_trait]
impl ResponseCache for LruResponseCache {
    async fn get(&self, key: &str) -> Option<CachedResponse> {
        self.inner.lock().await.get(&key.to_string()).cloned()
    }

    async fn put(&self, key: String, response: CachedResponse) {
        self.inner.lock().await.insert(key, response);
    }

    async fn clear(&self) {
        self.inner.lock().await.clear();
    }
}

/// Serves successful GETs from the cache and stores fresh ones.
pub async fn page_cache(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(cache) = state.page_cache.clone() else {
        return next.run(request).await;
    };
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = path_and_query(request.uri());
    if let Some(hit) = cache.get(&key).await {
        debug!(%key, "Page cache hit");
        return hit.into_response();
    }

    let response = next.run(request).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(%key, "Could not buffer response for caching: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "response body error").into_response();
        }
    };
    cache
        .put(
            key,
            CachedResponse {
                content_type: parts.headers.get(header::CONTENT_TYPE).cloned(),
                body: bytes.clone(),
            },
        )
        .await;
    Response::from_parts(parts, Body::from(bytes))
}
