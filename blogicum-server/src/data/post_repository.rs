use crate::domain::error::DomainError;
use crate::domain::page::PageRequest;
use crate::domain::policy::FeedFilter;
use crate::domain::post::{CategoryRef, LocationRef, Post, PostView};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{debug, error, info};
use uuid::Uuid;

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: Post) -> Result<Post, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError>;
    /// Overwrites every editable column. `None` if the post is gone.
    async fn update(&self, post: Post) -> Result<Option<Post>, DomainError>;
    /// Removes the post and its comments. `false` if nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
    /// One page of posts matching `filter`, newest first, plus the total
    /// number of matches.
    async fn list_feed(
        &self,
        filter: FeedFilter,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> Result<(Vec<PostView>, i64), DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PostViewRow {
    #[sqlx(flatten)]
    post: Post,
    author_username: String,
    category_title: Option<String>,
    category_slug: Option<String>,
    location_name: Option<String>,
    comment_count: i64,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        let category = match (row.post.category_id, row.category_title, row.category_slug) {
            (Some(id), Some(title), Some(slug)) => Some(CategoryRef { id, title, slug }),
            _ => None,
        };
        let location = match (row.post.location_id, row.location_name) {
            (Some(id), Some(name)) => Some(LocationRef { id, name }),
            _ => None,
        };
        PostView {
            post: row.post,
            author: row.author_username,
            category,
            location,
            comment_count: row.comment_count,
        }
    }
}

// Shared by the page and the count query; $1..$4 bind the feed filter.
const FEED_FROM_WHERE: &str = r#"
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN categories c ON c.id = p.category_id
    LEFT JOIN locations l ON l.id = p.location_id
    WHERE ($1::uuid IS NULL OR p.author_id = $1)
      AND ($2::uuid IS NULL OR p.category_id = $2)
      AND (NOT $3 OR (p.is_published AND p.pub_date <= $4 AND COALESCE(c.is_published, FALSE)))
"#;

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, post: Post) -> Result<Post, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, title, text, pub_date, author_id, location_id,
                               category_id, image, is_published, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.text)
        .bind(post.pub_date)
        .bind(post.author_id)
        .bind(post.location_id)
        .bind(post.category_id)
        .bind(&post.image)
        .bind(post.is_published)
        .bind(post.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(post_id = %post.id, author_id = %post.author_id, "post created");
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, text, pub_date, author_id, location_id,
                   category_id, image, is_published, created_at
            FROM posts WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find_by_id {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn update(&self, post: Post) -> Result<Option<Post>, DomainError> {
        let updated = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET title = $1, text = $2, pub_date = $3, location_id = $4,
                category_id = $5, image = $6, is_published = $7
            WHERE id = $8
            RETURNING id, title, text, pub_date, author_id, location_id,
                      category_id, image, is_published, created_at
            "#,
        )
        .bind(&post.title)
        .bind(&post.text)
        .bind(post.pub_date)
        .bind(post.location_id)
        .bind(post.category_id)
        .bind(&post.image)
        .bind(post.is_published)
        .bind(post.id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", post.id, e);
            DomainError::Internal(e.to_string())
        })?;

        if updated.is_some() {
            info!(post_id = %post.id, "post updated");
        }

        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to delete post {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })?;

        let removed = deleted.rows_affected() > 0;
        if removed {
            info!(post_id = %id, "post deleted");
        }
        Ok(removed)
    }

    async fn list_feed(
        &self,
        filter: FeedFilter,
        now: DateTime<Utc>,
        page: PageRequest,
    ) -> Result<(Vec<PostView>, i64), DomainError> {
        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) {FEED_FROM_WHERE}"))
            .bind(filter.author_id)
            .bind(filter.category_id)
            .bind(filter.public_only)
            .bind(now)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("db error while counting posts: {}", e);
                DomainError::Internal(e.to_string())
            })?;

        let rows = sqlx::query_as::<_, PostViewRow>(&format!(
            r#"
            SELECT p.id, p.title, p.text, p.pub_date, p.author_id, p.location_id,
                   p.category_id, p.image, p.is_published, p.created_at,
                   u.username AS author_username,
                   c.title AS category_title,
                   c.slug AS category_slug,
                   l.name AS location_name,
                   (SELECT COUNT(*) FROM comments cm WHERE cm.post_id = p.id) AS comment_count
            {FEED_FROM_WHERE}
            ORDER BY p.pub_date DESC, p.created_at DESC, p.id
            LIMIT $5 OFFSET $6
            "#
        ))
        .bind(filter.author_id)
        .bind(filter.category_id)
        .bind(filter.public_only)
        .bind(now)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching posts: {}", e);
            DomainError::Internal(e.to_string())
        })?;

        debug!(?filter, total, returned = rows.len(), "feed queried");
        Ok((rows.into_iter().map(PostView::from).collect(), total))
    }
}
