pub mod page_cache;
pub mod viewer_context_extractor;
pub mod viewer_context_middleware;

pub use page_cache::{page_cache, CachedResponse, LruResponseCache, ResponseCache};
pub use viewer_context_extractor::{LoggedIn, Vc};
pub use viewer_context_middleware::{viewer_context_middleware, SESSION_COOKIE};
