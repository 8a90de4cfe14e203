use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A comment joined with its author's username and its post's title
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CommentView {
    pub id: Uuid,
    pub text: String,
    pub post_id: Uuid,
    pub post_title: String,
    pub author_id: Uuid,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
}

impl CommentView {
    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }

    /// First ten characters, as shown in admin lists
    pub fn excerpt(&self) -> String {
        self.text.chars().take(10).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_is_char_based() {
        let comment = CommentView {
            id: Uuid::new_v4(),
            text: "Отличный пост, спасибо!".into(),
            post_id: Uuid::new_v4(),
            post_title: "Summit".into(),
            author_id: Uuid::new_v4(),
            author_username: "anna".into(),
            created_at: Utc::now(),
        };
        assert_eq!(comment.excerpt(), "Отличный п");
    }
}
