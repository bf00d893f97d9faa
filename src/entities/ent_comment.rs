// EntComment - text replies attached to a post

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use tracing::info;

use super::{AuthorSummary, Entity, EntityType};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::BlogDatabase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct EntComment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author: AuthorSummary,
}

#[derive(FromRow)]
struct CommentViewRow {
    id: i64,
    text: String,
    created: DateTime<Utc>,
    author_id: i64,
    author_username: String,
}

impl Entity for EntComment {
    fn entity_type() -> EntityType {
        EntityType::EntComment
    }
}

impl EntComment {
    pub async fn create(db: &BlogDatabase, post_id: i64, author_id: i64, text: &str) -> AppResult<Self> {
        let comment = sqlx::query_as::<_, EntComment>(
            "INSERT INTO comments (post_id, author_id, text, created) VALUES (?, ?, ?, ?) RETURNING *",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(text)
        .bind(Utc::now())
        .fetch_one(&db.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to add comment to post {}: {}", post_id, e))
        })?;

        info!("User {} commented on post {}", author_id, post_id);
        Ok(comment)
    }

    /// Comments on a post in the order they were written.
    pub async fn list_for_post(db: &BlogDatabase, post_id: i64) -> AppResult<Vec<CommentView>> {
        let rows = sqlx::query_as::<_, CommentViewRow>(
            "SELECT c.id, c.text, c.created, u.id AS author_id, u.username AS author_username
             FROM comments c
             JOIN users u ON u.id = c.author_id
             WHERE c.post_id = ?
             ORDER BY c.created ASC, c.id ASC",
        )
        .bind(post_id)
        .fetch_all(&db.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CommentView {
                id: row.id,
                text: row.text,
                created: row.created,
                author: AuthorSummary {
                    id: row.author_id,
                    username: row.author_username,
                },
            })
            .collect())
    }
}
