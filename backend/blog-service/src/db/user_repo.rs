use crate::models::{ProfileChanges, User};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, password_hash, is_staff, created_at";

/// Fields for a new account
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
    pub is_staff: bool,
}

pub async fn create_user(pool: &PgPool, new_user: &NewUser<'_>) -> Result<User, sqlx::Error> {
    let query = format!(
        r#"
        INSERT INTO users (username, email, first_name, last_name, password_hash, is_staff)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {USER_COLUMNS}
        "#
    );

    sqlx::query_as::<_, User>(&query)
        .bind(new_user.username)
        .bind(new_user.email)
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.password_hash)
        .bind(new_user.is_staff)
        .fetch_one(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    sqlx::query_as::<_, User>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
    sqlx::query_as::<_, User>(&query)
        .bind(username)
        .fetch_optional(pool)
        .await
}

/// Whether `username` belongs to someone other than `except`
pub async fn username_taken(
    pool: &PgPool,
    username: &str,
    except: Option<Uuid>,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM users
            WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2)
        )
        "#,
    )
    .bind(username)
    .bind(except)
    .fetch_one(pool)
    .await
}

pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    changes: &ProfileChanges,
) -> Result<User, sqlx::Error> {
    let query = format!(
        r#"
        UPDATE users
        SET first_name = $1, last_name = $2, username = $3, email = $4
        WHERE id = $5
        RETURNING {USER_COLUMNS}
        "#
    );

    sqlx::query_as::<_, User>(&query)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.username)
        .bind(&changes.email)
        .bind(user_id)
        .fetch_one(pool)
        .await
}
