use crate::models::Category;
use sqlx::PgPool;
use uuid::Uuid;

const CATEGORY_COLUMNS: &str = "id, title, description, slug, is_published, created_at";

/// All categories, for the post form and the admin list
pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, sqlx::Error> {
    let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY title ASC");
    sqlx::query_as::<_, Category>(&query).fetch_all(pool).await
}

pub async fn find_category(pool: &PgPool, category_id: Uuid) -> Result<Option<Category>, sqlx::Error> {
    let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
    sqlx::query_as::<_, Category>(&query)
        .bind(category_id)
        .fetch_optional(pool)
        .await
}

/// Category by slug, only while it is published
pub async fn find_published_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<Category>, sqlx::Error> {
    let query = format!(
        "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1 AND is_published = TRUE"
    );
    sqlx::query_as::<_, Category>(&query)
        .bind(slug)
        .fetch_optional(pool)
        .await
}

pub async fn create_category(
    pool: &PgPool,
    title: &str,
    description: &str,
    slug: &str,
    is_published: bool,
) -> Result<Category, sqlx::Error> {
    let query = format!(
        r#"
        INSERT INTO categories (title, description, slug, is_published)
        VALUES ($1, $2, $3, $4)
        RETURNING {CATEGORY_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Category>(&query)
        .bind(title)
        .bind(description)
        .bind(slug)
        .bind(is_published)
        .fetch_one(pool)
        .await
}

/// Returns the number of rows touched
pub async fn set_published(
    pool: &PgPool,
    category_id: Uuid,
    is_published: bool,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE categories SET is_published = $1 WHERE id = $2")
        .bind(is_published)
        .bind(category_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Posts in the category survive with `category_id` nulled
pub async fn delete_category(pool: &PgPool, category_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(category_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
