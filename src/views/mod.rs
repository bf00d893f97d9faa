// HTTP handlers. Each returns a template name plus context, a redirect, or an error page.

pub mod about;
pub mod auth;
pub mod errors;
pub mod posts;
pub mod profile;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    app_state::AppState,
    entities::{EntUser, ProfileStats},
    error::AppResult,
};

/// Author block shown on profile and post pages.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileAuthor {
    pub id: i64,
    pub username: String,
    pub date_joined: DateTime<Utc>,
    #[serde(flatten)]
    pub stats: ProfileStats,
}

impl ProfileAuthor {
    pub async fn load(state: &AppState, user: &EntUser) -> AppResult<Self> {
        let stats = user.gen_stats(&state.db).await?;
        Ok(Self {
            id: user.id,
            username: user.username.clone(),
            date_joined: user.date_joined,
            stats,
        })
    }
}
