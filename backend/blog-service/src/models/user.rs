use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// "First Last", falling back to the username
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Editable profile fields
#[derive(Debug, Clone)]
pub struct ProfileChanges {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: "leo".into(),
            email: String::new(),
            first_name: first.into(),
            last_name: last.into(),
            password_hash: "$argon2id$...".into(),
            is_staff: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(user("Leo", "Tolstoy").display_name(), "Leo Tolstoy");
        assert_eq!(user("Leo", "").display_name(), "Leo");
        assert_eq!(user(" ", "").display_name(), "leo");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(user("Leo", "")).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "leo");
    }
}
