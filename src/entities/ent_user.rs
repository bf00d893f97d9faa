// EntUser - accounts that author posts, comment and follow

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use tracing::info;

use super::{is_unique_violation, Entity, EntityType};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::BlogDatabase;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EntUser {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date_joined: DateTime<Utc>,
}

/// What other entities embed when they render their author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorSummary {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, FromRow)]
pub struct ProfileStats {
    pub posts_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
}

impl Entity for EntUser {
    fn entity_type() -> EntityType {
        EntityType::EntUser
    }
}

impl EntUser {
    pub async fn create(db: &BlogDatabase, username: &str, password_hash: &str) -> AppResult<Self> {
        let user = sqlx::query_as::<_, EntUser>(
            "INSERT INTO users (username, password_hash, date_joined) VALUES (?, ?, ?) RETURNING *",
        )
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&db.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Validation("A user with that username already exists.".to_string())
            } else {
                AppError::DatabaseError(format!("Failed to create user {}: {}", username, e))
            }
        })?;

        info!("Created user {} (ID: {})", user.username, user.id);
        Ok(user)
    }

    pub async fn gen_by_username(db: &BlogDatabase, username: &str) -> AppResult<Option<Self>> {
        let user = sqlx::query_as::<_, EntUser>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&db.pool)
            .await?;
        Ok(user)
    }

    pub async fn gen_enforce_by_username(db: &BlogDatabase, username: &str) -> AppResult<Self> {
        Self::gen_by_username(db, username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))
    }

    pub async fn username_exists(db: &BlogDatabase, username: &str) -> AppResult<bool> {
        let row: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&db.pool)
            .await?;
        Ok(row.is_some())
    }

    pub async fn gen_stats(&self, db: &BlogDatabase) -> AppResult<ProfileStats> {
        let stats = sqlx::query_as::<_, ProfileStats>(
            "SELECT
                (SELECT COUNT(*) FROM posts WHERE author_id = ?1) AS posts_count,
                (SELECT COUNT(*) FROM follows WHERE author_id = ?1) AS followers_count,
                (SELECT COUNT(*) FROM follows WHERE user_id = ?1) AS following_count",
        )
        .bind(self.id)
        .fetch_one(&db.pool)
        .await?;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = BlogDatabase::in_memory().await.unwrap();
        let john = EntUser::create(&db, "john", "hash").await.unwrap();

        let by_name = EntUser::gen_by_username(&db, "john").await.unwrap().unwrap();
        assert_eq!(by_name.id, john.id);
        let by_id = EntUser::gen_enforce(&db, john.id).await.unwrap();
        assert_eq!(by_id.username, "john");
        assert!(EntUser::username_exists(&db, "john").await.unwrap());
        assert!(!EntUser::username_exists(&db, "jane").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let db = BlogDatabase::in_memory().await.unwrap();
        EntUser::create(&db, "john", "hash").await.unwrap();
        let err = EntUser::create(&db, "john", "other").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_username_is_not_found() {
        let db = BlogDatabase::in_memory().await.unwrap();
        let err = EntUser::gen_enforce_by_username(&db, "ghost").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = EntUser {
            id: 1,
            username: "john".to_string(),
            password_hash: "secret".to_string(),
            date_joined: Utc::now(),
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["username"], "john");
    }
}
