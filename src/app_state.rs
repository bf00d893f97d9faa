use std::sync::Arc;

use crate::{
    config::Config,
    infrastructure::{
        database::BlogDatabase,
        media::MediaStore,
        middleware::{LruResponseCache, ResponseCache},
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<BlogDatabase>,
    pub media: MediaStore,
    pub page_cache: Option<Arc<dyn ResponseCache>>,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let database = BlogDatabase::new(&config.database.url).await?;
        database.init().await?;
        Ok(Self::with_database(config, Arc::new(database)))
    }

    pub fn with_database(config: Config, db: Arc<BlogDatabase>) -> Self {
        let page_cache = LruResponseCache::new(config.cache.capacity, config.cache_ttl())
            .map(|cache| Arc::new(cache) as Arc<dyn ResponseCache>);

        Self {
            db,
            media: MediaStore::new(config.media.root.clone()),
            page_cache,
            config,
        }
    }

    /// Drops every cached page; called after writes that change listings.
    pub async fn invalidate_pages(&self) {
        if let Some(cache) = &self.page_cache {
            cache.clear().await;
        }
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.config.session.ttl_hours)
    }
}
