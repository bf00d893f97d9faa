// EntGroup - named post categories, addressed by slug

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use sqlx::FromRow;
use tracing::info;

use super::{is_unique_violation, Entity, EntityType};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::BlogDatabase;

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug regex"));

pub const TITLE_MAX_LENGTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct EntGroup {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Group as embedded in a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
}

impl Entity for EntGroup {
    fn entity_type() -> EntityType {
        EntityType::EntGroup
    }
}

impl NewGroup {
    pub fn validate(&self) -> AppResult<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("Group title is required".to_string()));
        }
        if self.title.chars().count() > TITLE_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "Group title must be at most {} characters",
                TITLE_MAX_LENGTH
            )));
        }
        if !SLUG_RE.is_match(&self.slug) {
            return Err(AppError::Validation(format!(
                "Invalid slug {:?}: use letters, numbers, underscores or hyphens",
                self.slug
            )));
        }
        Ok(())
    }
}

impl EntGroup {
    /// Groups are only created through the management CLI.
    pub async fn create(db: &BlogDatabase, group: NewGroup) -> AppResult<Self> {
        group.validate()?;
        let created = sqlx::query_as::<_, EntGroup>(
            "INSERT INTO post_groups (title, slug, description) VALUES (?, ?, ?) RETURNING *",
        )
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .fetch_one(&db.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Validation(format!("Group with slug {} already exists", group.slug))
            } else {
                AppError::DatabaseError(format!("Failed to create group {}: {}", group.slug, e))
            }
        })?;

        info!("Created group {} (ID: {})", created.slug, created.id);
        Ok(created)
    }

    pub async fn gen_by_slug(db: &BlogDatabase, slug: &str) -> AppResult<Option<Self>> {
        let group = sqlx::query_as::<_, EntGroup>("SELECT * FROM post_groups WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&db.pool)
            .await?;
        Ok(group)
    }

    pub async fn gen_enforce_by_slug(db: &BlogDatabase, slug: &str) -> AppResult<Self> {
        Self::gen_by_slug(db, slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", slug)))
    }

    /// Every group, for the post form's selector.
    pub async fn gen_all(db: &BlogDatabase) -> AppResult<Vec<Self>> {
        let groups = sqlx::query_as::<_, EntGroup>("SELECT * FROM post_groups ORDER BY title, id")
            .fetch_all(&db.pool)
            .await?;
        Ok(groups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_group(slug: &str) -> NewGroup {
        NewGroup {
            title: "Тестовая группа".to_string(),
            slug: slug.to_string(),
            description: "тестовое описание".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_by_slug() {
        let db = BlogDatabase::in_memory().await.unwrap();
        let group = EntGroup::create(&db, new_group("test-group")).await.unwrap();

        let found = EntGroup::gen_enforce_by_slug(&db, "test-group").await.unwrap();
        assert_eq!(found, group);
        assert_eq!(found.title, "Тестовая группа");
    }

    #[tokio::test]
    async fn test_slug_is_unique() {
        let db = BlogDatabase::in_memory().await.unwrap();
        EntGroup::create(&db, new_group("test-group")).await.unwrap();
        let err = EntGroup::create(&db, new_group("test-group")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_unknown_slug_is_not_found() {
        let db = BlogDatabase::in_memory().await.unwrap();
        let err = EntGroup::gen_enforce_by_slug(&db, "nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_slug_validation() {
        assert!(new_group("test_group-2").validate().is_ok());
        assert!(new_group("test group").validate().is_err());
        assert!(new_group("").validate().is_err());

        let mut long_title = new_group("long");
        long_title.title = "x".repeat(TITLE_MAX_LENGTH + 1);
        assert!(long_title.validate().is_err());
    }
}
