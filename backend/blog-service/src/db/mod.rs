/// Database access layer
///
/// Repositories are free functions over `&PgPool`, one module per table.
/// Post reads take a [`PostScope`](crate::models::PostScope) and the
/// request's `now`; the visibility predicate lives in `post_repo`.
pub mod category_repo;
pub mod comment_repo;
pub mod location_repo;
pub mod post_repo;
pub mod user_repo;

use sqlx::PgPool;

/// Apply pending migrations from `migrations/`
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Postgres `unique_violation`
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
    }
}
