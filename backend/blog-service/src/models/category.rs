use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Short label used in selects and admin lists
    pub fn label(&self) -> String {
        let title: String = self.title.chars().take(15).collect();
        format!("{}/ {}", title, self.slug)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_label_truncates_title() {
        let category = Category {
            id: Uuid::new_v4(),
            title: "Mountain hiking in the Caucasus".into(),
            description: String::new(),
            slug: "travel".into(),
            is_published: true,
            created_at: Utc::now(),
        };
        assert_eq!(category.label(), "Mountain hiking/ travel");
    }
}
