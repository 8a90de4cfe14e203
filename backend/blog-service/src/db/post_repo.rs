/// Post queries
///
/// Every read goes through one SELECT shape joined with author, category and
/// location and annotated with a comment count. The scope is bound as `$1`:
/// when TRUE the public visibility predicate applies against `$2` (now):
///
/// ```text
/// p.is_published AND (category IS NULL OR category.is_published) AND p.pub_date <= now
/// ```
///
/// This must agree with `PostView::is_publicly_visible`.
use crate::models::{PostChanges, PostScope, PostView};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const POST_SELECT: &str = r#"
    SELECT p.id, p.title, p.text, p.pub_date,
           p.author_id, u.username AS author_username,
           p.location_id, loc.name AS location_name, loc.is_published AS location_is_published,
           p.category_id, cat.title AS category_title, cat.slug AS category_slug,
           cat.is_published AS category_is_published,
           p.image, p.is_published, p.created_at,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN categories cat ON cat.id = p.category_id
    LEFT JOIN locations loc ON loc.id = p.location_id
"#;

const SCOPE_PREDICATE: &str = r#"
    (NOT $1::bool OR (p.is_published AND (cat.id IS NULL OR cat.is_published) AND p.pub_date <= $2))
"#;

const FILTER_PREDICATE: &str = r#"
    ($3::uuid IS NULL OR p.author_id = $3) AND ($4::uuid IS NULL OR p.category_id = $4)
"#;

/// Optional narrowing of a listing
#[derive(Debug, Clone, Copy, Default)]
pub struct PostFilter {
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
}

impl PostFilter {
    pub fn by_author(author_id: Uuid) -> Self {
        Self {
            author_id: Some(author_id),
            ..Self::default()
        }
    }

    pub fn by_category(category_id: Uuid) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::default()
        }
    }
}

fn published_flag(scope: PostScope) -> bool {
    matches!(scope, PostScope::Published)
}

pub async fn count_posts(
    pool: &PgPool,
    scope: PostScope,
    now: DateTime<Utc>,
    filter: PostFilter,
) -> Result<i64, sqlx::Error> {
    let query = format!(
        r#"
        SELECT COUNT(*)
        FROM posts p
        LEFT JOIN categories cat ON cat.id = p.category_id
        WHERE {SCOPE_PREDICATE} AND {FILTER_PREDICATE}
        "#
    );

    sqlx::query_scalar::<_, i64>(&query)
        .bind(published_flag(scope))
        .bind(now)
        .bind(filter.author_id)
        .bind(filter.category_id)
        .fetch_one(pool)
        .await
}

/// Newest `pub_date` first
pub async fn list_posts(
    pool: &PgPool,
    scope: PostScope,
    now: DateTime<Utc>,
    filter: PostFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<PostView>, sqlx::Error> {
    let query = format!(
        r#"
        {POST_SELECT}
        WHERE {SCOPE_PREDICATE} AND {FILTER_PREDICATE}
        ORDER BY p.pub_date DESC, p.created_at DESC
        LIMIT $5 OFFSET $6
        "#
    );

    sqlx::query_as::<_, PostView>(&query)
        .bind(published_flag(scope))
        .bind(now)
        .bind(filter.author_id)
        .bind(filter.category_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

/// Single post by id within `scope`
pub async fn find_post(
    pool: &PgPool,
    scope: PostScope,
    now: DateTime<Utc>,
    post_id: Uuid,
) -> Result<Option<PostView>, sqlx::Error> {
    let query = format!(
        r#"
        {POST_SELECT}
        WHERE {SCOPE_PREDICATE} AND p.id = $3
        "#
    );

    sqlx::query_as::<_, PostView>(&query)
        .bind(published_flag(scope))
        .bind(now)
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

pub async fn create_post(
    pool: &PgPool,
    author_id: Uuid,
    changes: &PostChanges,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO posts (title, text, pub_date, author_id, location_id, category_id, image)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        "#,
    )
    .bind(&changes.title)
    .bind(&changes.text)
    .bind(changes.pub_date)
    .bind(author_id)
    .bind(changes.location_id)
    .bind(changes.category_id)
    .bind(&changes.image)
    .fetch_one(pool)
    .await
}

pub async fn update_post(
    pool: &PgPool,
    post_id: Uuid,
    changes: &PostChanges,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE posts
        SET title = $1, text = $2, pub_date = $3, location_id = $4, category_id = $5, image = $6
        WHERE id = $7
        "#,
    )
    .bind(&changes.title)
    .bind(&changes.text)
    .bind(changes.pub_date)
    .bind(changes.location_id)
    .bind(changes.category_id)
    .bind(&changes.image)
    .bind(post_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Inline edit from the admin post list
pub async fn update_post_flags(
    pool: &PgPool,
    post_id: Uuid,
    pub_date: DateTime<Utc>,
    is_published: bool,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE posts SET pub_date = $1, is_published = $2 WHERE id = $3")
        .bind(pub_date)
        .bind(is_published)
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

/// Comments go with the post
pub async fn delete_post(pool: &PgPool, post_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(post_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
