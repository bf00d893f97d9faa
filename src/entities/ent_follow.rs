// EntFollow - directed subscription edges driving the follow feed
// At most one edge per (follower, author) pair and never a self edge; the
// schema enforces both and `create` reports which case applied.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use tracing::{debug, info};

use super::{Entity, EntityType};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::BlogDatabase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct EntFollow {
    pub id: i64,
    pub user_id: i64,
    pub author_id: i64,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    SelfFollow,
}

impl Entity for EntFollow {
    fn entity_type() -> EntityType {
        EntityType::EntFollow
    }
}

impl EntFollow {
    pub async fn create(db: &BlogDatabase, user_id: i64, author_id: i64) -> AppResult<FollowOutcome> {
        if user_id == author_id {
            debug!("User {} tried to follow themself", user_id);
            return Ok(FollowOutcome::SelfFollow);
        }

        let result = sqlx::query(
            "INSERT INTO follows (user_id, author_id, created) VALUES (?, ?, ?)
             ON CONFLICT(user_id, author_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(author_id)
        .bind(Utc::now())
        .execute(&db.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!(
                "Failed to create follow {} -> {}: {}",
                user_id, author_id, e
            ))
        })?;

        if result.rows_affected() == 0 {
            return Ok(FollowOutcome::AlreadyFollowing);
        }
        info!("User {} now follows {}", user_id, author_id);
        Ok(FollowOutcome::Created)
    }

    /// Removes the edge if present; reports whether one existed.
    pub async fn remove(db: &BlogDatabase, user_id: i64, author_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM follows WHERE user_id = ? AND author_id = ?")
            .bind(user_id)
            .bind(author_id)
            .execute(&db.pool)
            .await?;
        let removed = result.rows_affected() > 0;
        if removed {
            info!("User {} unfollowed {}", user_id, author_id);
        }
        Ok(removed)
    }

    pub async fn exists(db: &BlogDatabase, user_id: i64, author_id: i64) -> AppResult<bool> {
        let row: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM follows WHERE user_id = ? AND author_id = ?")
                .bind(user_id)
                .bind(author_id)
                .fetch_optional(&db.pool)
                .await?;
        Ok(row.is_some())
    }
}
