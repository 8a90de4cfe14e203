use crate::models::CommentView;
use sqlx::PgPool;
use uuid::Uuid;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.text, c.post_id, p.title AS post_title,
           c.author_id, u.username AS author_username, c.created_at
    FROM comments c
    JOIN posts p ON p.id = c.post_id
    JOIN users u ON u.id = c.author_id
"#;

/// Comments on a post, oldest first
pub async fn list_for_post(pool: &PgPool, post_id: Uuid) -> Result<Vec<CommentView>, sqlx::Error> {
    let query = format!("{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.created_at ASC");
    sqlx::query_as::<_, CommentView>(&query)
        .bind(post_id)
        .fetch_all(pool)
        .await
}

/// Newest first, for the admin list
pub async fn list_recent(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<CommentView>, sqlx::Error> {
    let query = format!("{COMMENT_SELECT} ORDER BY c.created_at DESC LIMIT $1 OFFSET $2");
    sqlx::query_as::<_, CommentView>(&query)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments")
        .fetch_one(pool)
        .await
}

pub async fn find_comment(pool: &PgPool, comment_id: Uuid) -> Result<Option<CommentView>, sqlx::Error> {
    let query = format!("{COMMENT_SELECT} WHERE c.id = $1");
    sqlx::query_as::<_, CommentView>(&query)
        .bind(comment_id)
        .fetch_optional(pool)
        .await
}

pub async fn create_comment(
    pool: &PgPool,
    post_id: Uuid,
    author_id: Uuid,
    text: &str,
) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO comments (post_id, author_id, text)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(text)
    .fetch_one(pool)
    .await
}

pub async fn update_comment(pool: &PgPool, comment_id: Uuid, text: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE comments SET text = $1 WHERE id = $2")
        .bind(text)
        .bind(comment_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_comment(pool: &PgPool, comment_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
