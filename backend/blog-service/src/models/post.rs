use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Which posts a read may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    /// Only publicly visible posts (see [`PostView::is_publicly_visible`])
    Published,
    /// Every post, for an author looking at their own content
    All,
}

/// A post as listed or displayed: joined with author, category and location
/// and annotated with its comment count.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub author_username: String,
    pub location_id: Option<Uuid>,
    pub location_name: Option<String>,
    pub location_is_published: Option<bool>,
    pub category_id: Option<Uuid>,
    pub category_title: Option<String>,
    pub category_slug: Option<String>,
    pub category_is_published: Option<bool>,
    /// Path relative to the media root, empty when there is no image
    pub image: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub comment_count: i64,
}

impl PostView {
    /// The public visibility rule. `db::post_repo` expresses the same
    /// predicate in SQL; the two must agree.
    pub fn is_publicly_visible(&self, now: DateTime<Utc>) -> bool {
        self.is_published && self.category_is_published.unwrap_or(true) && self.pub_date <= now
    }

    pub fn is_scheduled(&self, now: DateTime<Utc>) -> bool {
        self.pub_date > now
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }

    /// Location name, only when the location itself is published
    pub fn visible_location_name(&self) -> Option<&str> {
        match self.location_is_published {
            Some(true) => self.location_name.as_deref(),
            _ => None,
        }
    }
}

/// Field values written on create and update
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub location_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub image: String,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn post(now: DateTime<Utc>) -> PostView {
        PostView {
            id: Uuid::new_v4(),
            title: "Summit".into(),
            text: "We made it.".into(),
            pub_date: now - chrono::Duration::hours(1),
            author_id: Uuid::new_v4(),
            author_username: "leo".into(),
            location_id: None,
            location_name: None,
            location_is_published: None,
            category_id: Some(Uuid::new_v4()),
            category_title: Some("Travel".into()),
            category_slug: Some("travel".into()),
            category_is_published: Some(true),
            image: String::new(),
            is_published: true,
            created_at: now - chrono::Duration::hours(2),
            comment_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::post;
    use chrono::{Duration, Utc};

    #[test]
    fn test_visible_when_all_flags_hold() {
        let now = Utc::now();
        assert!(post(now).is_publicly_visible(now));
    }

    #[test]
    fn test_hidden_when_unpublished() {
        let now = Utc::now();
        let mut p = post(now);
        p.is_published = false;
        assert!(!p.is_publicly_visible(now));
    }

    #[test]
    fn test_hidden_when_category_unpublished() {
        let now = Utc::now();
        let mut p = post(now);
        p.category_is_published = Some(false);
        assert!(!p.is_publicly_visible(now));
    }

    #[test]
    fn test_visible_without_category() {
        let now = Utc::now();
        let mut p = post(now);
        p.category_id = None;
        p.category_title = None;
        p.category_slug = None;
        p.category_is_published = None;
        assert!(p.is_publicly_visible(now));
    }

    #[test]
    fn test_scheduled_post_hidden_until_pub_date() {
        let now = Utc::now();
        let mut p = post(now);
        p.pub_date = now + Duration::hours(1);
        assert!(p.is_scheduled(now));
        assert!(!p.is_publicly_visible(now));
        assert!(p.is_publicly_visible(now + Duration::hours(1)));
    }

    #[test]
    fn test_pub_date_equal_to_now_is_visible() {
        let now = Utc::now();
        let mut p = post(now);
        p.pub_date = now;
        assert!(p.is_publicly_visible(now));
    }

    #[test]
    fn test_location_name_requires_published_location() {
        let now = Utc::now();
        let mut p = post(now);
        p.location_name = Some("Elbrus".into());
        p.location_is_published = Some(false);
        assert_eq!(p.visible_location_name(), None);

        p.location_is_published = Some(true);
        assert_eq!(p.visible_location_name(), Some("Elbrus"));
    }
}
