/// Ownership checks for posts and comments
///
/// Mutations are allowed only to the author. A refusal is not an error: the
/// caller redirects to the post's public detail page and changes nothing.
use uuid::Uuid;

use crate::models::{CommentView, PostView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owner,
    Foreign,
}

pub fn ownership(author_id: Uuid, user_id: Uuid) -> Ownership {
    if author_id == user_id {
        Ownership::Owner
    } else {
        Ownership::Foreign
    }
}

pub fn check_post_ownership(user_id: Uuid, post: &PostView) -> Ownership {
    ownership(post.author_id, user_id)
}

pub fn check_comment_ownership(user_id: Uuid, comment: &CommentView) -> Ownership {
    ownership(comment.author_id, user_id)
}

/// Outcome of an ownership-gated load
#[derive(Debug)]
pub enum Gate<T> {
    Allowed(T),
    /// Not the author: redirect here instead
    Redirect(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::fixtures::post;
    use chrono::Utc;

    #[test]
    fn test_author_owns_post() {
        let p = post(Utc::now());
        assert_eq!(check_post_ownership(p.author_id, &p), Ownership::Owner);
        assert_eq!(check_post_ownership(Uuid::new_v4(), &p), Ownership::Foreign);
    }

    #[test]
    fn test_comment_ownership_ignores_post_author() {
        let p = post(Utc::now());
        let comment = CommentView {
            id: Uuid::new_v4(),
            text: "hi".into(),
            post_id: p.id,
            post_title: p.title.clone(),
            author_id: Uuid::new_v4(),
            author_username: "anna".into(),
            created_at: Utc::now(),
        };
        assert_eq!(check_comment_ownership(p.author_id, &comment), Ownership::Foreign);
        assert_eq!(check_comment_ownership(comment.author_id, &comment), Ownership::Owner);
    }
}
