// Blog entities - row types plus their database methods

use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, FromRow};

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::BlogDatabase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    EntUser,
    EntGroup,
    EntPost,
    EntComment,
    EntFollow,
    EntSession,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::EntUser => "ent_user",
            EntityType::EntGroup => "ent_group",
            EntityType::EntPost => "ent_post",
            EntityType::EntComment => "ent_comment",
            EntityType::EntFollow => "ent_follow",
            EntityType::EntSession => "ent_session",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            EntityType::EntUser => "users",
            EntityType::EntGroup => "post_groups",
            EntityType::EntPost => "posts",
            EntityType::EntComment => "comments",
            EntityType::EntFollow => "follows",
            EntityType::EntSession => "sessions",
        }
    }
}

/// Lookups shared by every entity keyed on an integer `id`.
#[async_trait]
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + Sized {
    fn entity_type() -> EntityType;

    async fn gen_nullable(db: &BlogDatabase, id: i64) -> AppResult<Option<Self>> {
        let sql = format!("SELECT * FROM {} WHERE id = ?", Self::entity_type().table());
        let row = sqlx::query_as::<_, Self>(&sql)
            .bind(id)
            .fetch_optional(&db.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to load {} {}: {}",
                    Self::entity_type().as_str(),
                    id,
                    e
                ))
            })?;
        Ok(row)
    }

    /// Like `gen_nullable`, but a missing row is `AppError::NotFound`.
    async fn gen_enforce(db: &BlogDatabase, id: i64) -> AppResult<Self> {
        Self::gen_nullable(db, id).await?.ok_or_else(|| {
            AppError::NotFound(format!("{} with id {} not found", Self::entity_type().as_str(), id))
        })
    }

    async fn count(db: &BlogDatabase) -> AppResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", Self::entity_type().table());
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&db.pool).await?;
        Ok(count)
    }

    async fn delete(db: &BlogDatabase, id: i64) -> AppResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", Self::entity_type().table());
        let result = sqlx::query(&sql).bind(id).execute(&db.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

pub mod ent_comment;
pub mod ent_follow;
pub mod ent_group;
pub mod ent_post;
pub mod ent_session;
pub mod ent_user;

pub use ent_comment::{CommentView, EntComment};
pub use ent_follow::{EntFollow, FollowOutcome};
pub use ent_group::{EntGroup, GroupSummary, NewGroup};
pub use ent_post::{EntPost, NewPost, PostChanges, PostFilter, PostView};
pub use ent_session::EntSession;
pub use ent_user::{AuthorSummary, EntUser, ProfileStats};
