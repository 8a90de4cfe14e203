/// Account service - registration, login, profile edits and staff checks
use crypto_core::{hash_password, jwt, verify_password, PasswordError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::user_repo::{self, NewUser};
use crate::db::is_unique_violation;
use crate::error::{AppError, Result};
use crate::forms::{FormErrors, RegistrationForm, Submitted, UserForm};
use crate::middleware::SessionUser;
use crate::models::{ProfileChanges, User};

const USERNAME_TAKEN: &str = "Пользователь с таким именем уже существует.";

pub struct AccountService {
    pool: PgPool,
}

impl AccountService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn register(&self, form: &RegistrationForm) -> Result<Submitted<User>> {
        let mut errors = form.validate_fields();
        let username = form.username.trim();
        if !errors.has("username")
            && user_repo::username_taken(&self.pool, username, None).await?
        {
            errors.add("username", USERNAME_TAKEN);
        }
        if !errors.is_empty() {
            return Ok(Submitted::Invalid(errors));
        }

        let password_hash = hash_password(&form.password1)?;
        let new_user = NewUser {
            username,
            email: form.email.trim(),
            first_name: "",
            last_name: "",
            password_hash: &password_hash,
            is_staff: false,
        };

        match user_repo::create_user(&self.pool, &new_user).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "user registered");
                Ok(Submitted::Saved(user))
            }
            // Lost a race with another registration
            Err(err) if is_unique_violation(&err) => {
                let mut errors = FormErrors::default();
                errors.add("username", USERNAME_TAKEN);
                Ok(Submitted::Invalid(errors))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// `None` for an unknown user or a wrong password
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = user_repo::find_by_username(&self.pool, username.trim()).await? else {
            return Ok(None);
        };

        match verify_password(password, &user.password_hash) {
            Ok(()) => Ok(Some(user)),
            Err(PasswordError::InvalidCredentials) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn find_user(&self, user_id: Uuid) -> Result<User> {
        user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user {}", user_id)))
    }

    pub async fn update_profile(&self, user_id: Uuid, form: &UserForm) -> Result<Submitted<User>> {
        let mut errors = form.validate_fields();
        if !errors.has("username")
            && user_repo::username_taken(&self.pool, &form.username, Some(user_id)).await?
        {
            errors.add("username", USERNAME_TAKEN);
        }
        if !errors.is_empty() {
            return Ok(Submitted::Invalid(errors));
        }

        let changes = ProfileChanges {
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            username: form.username.clone(),
            email: form.email.clone(),
        };

        match user_repo::update_profile(&self.pool, user_id, &changes).await {
            Ok(user) => {
                tracing::info!(%user_id, "profile updated");
                Ok(Submitted::Saved(user))
            }
            Err(err) if is_unique_violation(&err) => {
                let mut errors = FormErrors::default();
                errors.add("username", USERNAME_TAKEN);
                Ok(Submitted::Invalid(errors))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Staff account for the admin screens
    pub async fn create_staff(&self, username: &str, email: &str, password: &str) -> Result<User> {
        let password_hash = hash_password(password)?;
        let user = user_repo::create_user(
            &self.pool,
            &NewUser {
                username,
                email,
                first_name: "",
                last_name: "",
                password_hash: &password_hash,
                is_staff: true,
            },
        )
        .await?;
        tracing::info!(user_id = %user.id, "staff user created");
        Ok(user)
    }

    /// The account behind the session, which must be staff
    pub async fn require_staff(&self, session: &SessionUser) -> Result<User> {
        let user = user_repo::find_by_id(&self.pool, session.id).await?;
        match user {
            Some(user) if user.is_staff => Ok(user),
            _ => {
                tracing::info!(user_id = %session.id, "non-staff user denied admin access");
                Err(AppError::Forbidden("staff only".into()))
            }
        }
    }
}

/// Signed session token for `user`
pub fn issue_session_token(user: &User, ttl_hours: i64) -> Result<String> {
    Ok(jwt::generate_session_token(
        user.id,
        &user.username,
        chrono::Duration::hours(ttl_hours),
    )?)
}

/// Post-login destination: a local `next`, else the user's profile
pub fn login_redirect(next: Option<&str>, user: &User) -> String {
    match next {
        Some(next) if crate::urls::is_safe_next(next) => next.to_string(),
        _ => crate::urls::profile(&user.username),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "leo".into(),
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: String::new(),
            is_staff: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_login_redirect() {
        let user = user();
        assert_eq!(login_redirect(Some("/posts/create/"), &user), "/posts/create/");
        assert_eq!(login_redirect(Some("https://evil.example/"), &user), "/profile/leo/");
        assert_eq!(login_redirect(None, &user), "/profile/leo/");
    }

    #[test]
    fn test_session_token_carries_identity() {
        crypto_core::testing::init_test_keys();
        let user = user();
        let token = issue_session_token(&user, 1).unwrap();
        let session = crate::middleware::session_user_from_token(&token).unwrap();
        assert_eq!(session.id, user.id);
        assert_eq!(session.username, "leo");
    }
}
