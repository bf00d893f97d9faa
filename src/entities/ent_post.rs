// EntPost - user-authored entries, optionally grouped and illustrated

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::Sqlite, FromRow, QueryBuilder};
use tracing::{debug, info};

use super::{AuthorSummary, Entity, EntityType, GroupSummary};
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::BlogDatabase;
use crate::infrastructure::media::media_url;
use crate::paginator::{Page, Paginator, PAGE_SIZE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct EntPost {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Editable fields. `image` replaces the stored path, `None` inside clears it.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<Option<String>>,
}

/// Which posts a listing shows. Every listing is newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by anyone the given user follows.
    FollowedBy(i64),
}

/// A post joined with its author, group and comment count.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub image: Option<String>,
    pub image_url: Option<String>,
    pub author: AuthorSummary,
    pub group: Option<GroupSummary>,
    pub comment_count: i64,
}

#[derive(FromRow)]
struct PostViewRow {
    id: i64,
    text: String,
    pub_date: DateTime<Utc>,
    image: Option<String>,
    author_id: i64,
    author_username: String,
    group_id: Option<i64>,
    group_title: Option<String>,
    group_slug: Option<String>,
    comment_count: i64,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        let group = match (row.group_id, row.group_title, row.group_slug) {
            (Some(id), Some(title), Some(slug)) => Some(GroupSummary { id, title, slug }),
            _ => None,
        };
        PostView {
            id: row.id,
            text: row.text,
            pub_date: row.pub_date,
            image_url: row.image.as_deref().map(media_url),
            image: row.image,
            author: AuthorSummary {
                id: row.author_id,
                username: row.author_username,
            },
            group,
            comment_count: row.comment_count,
        }
    }
}

const POST_VIEW_SELECT: &str = "SELECT p.id, p.text, p.pub_date, p.image, \
     u.id AS author_id, u.username AS author_username, \
     g.id AS group_id, g.title AS group_title, g.slug AS group_slug, \
     (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count \
     FROM posts p \
     JOIN users u ON u.id = p.author_id \
     LEFT JOIN post_groups g ON g.id = p.group_id";

impl PostFilter {
    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match *self {
            PostFilter::All => {}
            PostFilter::Group(group_id) => {
                qb.push(" WHERE p.group_id = ");
                qb.push_bind(group_id);
            }
            PostFilter::Author(author_id) => {
                qb.push(" WHERE p.author_id = ");
                qb.push_bind(author_id);
            }
            PostFilter::FollowedBy(user_id) => {
                qb.push(" WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ");
                qb.push_bind(user_id);
                qb.push(")");
            }
        }
    }
}

impl Entity for EntPost {
    fn entity_type() -> EntityType {
        EntityType::EntPost
    }
}

impl EntPost {
    pub async fn create(db: &BlogDatabase, post: NewPost) -> AppResult<Self> {
        let created = sqlx::query_as::<_, EntPost>(
            "INSERT INTO posts (text, pub_date, author_id, group_id, image) VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&post.text)
        .bind(Utc::now())
        .bind(post.author_id)
        .bind(post.group_id)
        .bind(&post.image)
        .fetch_one(&db.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create post: {}", e)))?;

        info!("Created post {} by user {}", created.id, created.author_id);
        Ok(created)
    }

    /// Applies `changes` in place and returns the stored row.
    pub async fn update(db: &BlogDatabase, id: i64, changes: PostChanges) -> AppResult<Self> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE posts SET text = ");
        qb.push_bind(changes.text);
        qb.push(", group_id = ");
        qb.push_bind(changes.group_id);
        if let Some(image) = changes.image {
            qb.push(", image = ");
            qb.push_bind(image);
        }
        qb.push(" WHERE id = ");
        qb.push_bind(id);
        qb.push(" RETURNING *");

        let updated = qb
            .build_query_as::<EntPost>()
            .fetch_optional(&db.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to update post {}: {}", id, e)))?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", id)))?;

        info!("Updated post {}", id);
        Ok(updated)
    }

    pub async fn gen_view(db: &BlogDatabase, id: i64) -> AppResult<Option<PostView>> {
        let mut qb = QueryBuilder::<Sqlite>::new(POST_VIEW_SELECT);
        qb.push(" WHERE p.id = ");
        qb.push_bind(id);
        let row = qb
            .build_query_as::<PostViewRow>()
            .fetch_optional(&db.pool)
            .await?;
        Ok(row.map(PostView::from))
    }

    pub async fn count_filtered(db: &BlogDatabase, filter: PostFilter) -> AppResult<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts p");
        filter.push_where(&mut qb);
        let count: i64 = qb.build_query_scalar().fetch_one(&db.pool).await?;
        Ok(count)
    }

    pub async fn list(
        db: &BlogDatabase,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<PostView>> {
        let mut qb = QueryBuilder::<Sqlite>::new(POST_VIEW_SELECT);
        filter.push_where(&mut qb);
        qb.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ");
        qb.push_bind(limit);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb
            .build_query_as::<PostViewRow>()
            .fetch_all(&db.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list posts: {}", e)))?;
        Ok(rows.into_iter().map(PostView::from).collect())
    }

    /// One page of `filter`, `PAGE_SIZE` posts per page.
    pub async fn paginate(
        db: &BlogDatabase,
        filter: PostFilter,
        requested_page: Option<&str>,
    ) -> AppResult<Page<PostView>> {
        let count = Self::count_filtered(db, filter).await?;
        let paginator = Paginator::new(count, PAGE_SIZE);
        let window = paginator.resolve(requested_page);
        debug!(?filter, count, page = window.number, "Paginating posts");
        let posts = Self::list(db, filter, window.limit, window.offset).await?;
        Ok(paginator.page(window, posts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{EntFollow, EntGroup, EntUser, NewGroup};

    async fn post(db: &BlogDatabase, author_id: i64, text: &str, group_id: Option<i64>) -> EntPost {
        EntPost::create(
            db,
            NewPost {
                author_id,
                text: text.to_string(),
                group_id,
                image: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_listing_is_newest_first_and_paged() {
        let db = BlogDatabase::in_memory().await.unwrap();
        let john = EntUser::create(&db, "john", "hash").await.unwrap();
        for n in 0..13 {
            post(&db, john.id, &n.to_string(), None).await;
        }

        let first = EntPost::paginate(&db, PostFilter::All, None).await.unwrap();
        assert_eq!(first.object_list.len(), 10);
        assert_eq!(first.num_pages, 2);
        assert_eq!(first.object_list[0].text, "12");

        let last = EntPost::paginate(&db, PostFilter::All, Some("7")).await.unwrap();
        assert_eq!(last.number, 2);
        assert_eq!(last.object_list.len(), 3);
        assert_eq!(last.object_list[2].text, "0");
    }

    #[tokio::test]
    async fn test_filters() {
        let db = BlogDatabase::in_memory().await.unwrap();
        let john = EntUser::create(&db, "john", "hash").await.unwrap();
        let jane = EntUser::create(&db, "jane", "hash").await.unwrap();
        let group = EntGroup::create(
            &db,
            NewGroup {
                title: "Тестовая группа".to_string(),
                slug: "test-group".to_string(),
                description: "тестовое описание".to_string(),
            },
        )
        .await
        .unwrap();

        post(&db, john.id, "grouped", Some(group.id)).await;
        post(&db, john.id, "loose", None).await;
        post(&db, jane.id, "jane's", None).await;

        let grouped = EntPost::list(&db, PostFilter::Group(group.id), 10, 0).await.unwrap();
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].group.as_ref().unwrap().slug, "test-group");

        let by_john = EntPost::count_filtered(&db, PostFilter::Author(john.id)).await.unwrap();
        assert_eq!(by_john, 2);

        EntFollow::create(&db, jane.id, john.id).await.unwrap();
        let feed = EntPost::list(&db, PostFilter::FollowedBy(jane.id), 10, 0).await.unwrap();
        assert_eq!(feed.len(), 2);
        assert!(feed.iter().all(|p| p.author.username == "john"));
    }

    #[tokio::test]
    async fn test_update_keeps_image_unless_asked() {
        let db = BlogDatabase::in_memory().await.unwrap();
        let john = EntUser::create(&db, "john", "hash").await.unwrap();
        let created = EntPost::create(
            &db,
            NewPost {
                author_id: john.id,
                text: "before".to_string(),
                group_id: None,
                image: Some("posts/small.gif".to_string()),
            },
        )
        .await
        .unwrap();

        let updated = EntPost::update(
            &db,
            created.id,
            PostChanges {
                text: "after".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.text, "after");
        assert_eq!(updated.image.as_deref(), Some("posts/small.gif"));
        assert_eq!(updated.pub_date, created.pub_date);

        let cleared = EntPost::update(
            &db,
            created.id,
            PostChanges {
                text: "after".to_string(),
                group_id: None,
                image: Some(None),
            },
        )
        .await
        .unwrap();
        assert_eq!(cleared.image, None);
    }

    #[tokio::test]
    async fn test_view_carries_media_url() {
        let db = BlogDatabase::in_memory().await.unwrap();
        let john = EntUser::create(&db, "john", "hash").await.unwrap();
        let created = EntPost::create(
            &db,
            NewPost {
                author_id: john.id,
                text: "Тестовый текст".to_string(),
                group_id: None,
                image: Some("posts/small.gif".to_string()),
            },
        )
        .await
        .unwrap();

        let view = EntPost::gen_view(&db, created.id).await.unwrap().unwrap();
        assert_eq!(view.text, "Тестовый текст");
        assert_eq!(view.author.username, "john");
        assert_eq!(view.image_url.as_deref(), Some("/media/posts/small.gif"));
        assert_eq!(view.comment_count, 0);
        assert!(EntPost::gen_view(&db, created.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_post_is_not_found() {
        let db = BlogDatabase::in_memory().await.unwrap();
        let err = EntPost::update(
            &db,
            42,
            PostChanges {
                text: "x".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
