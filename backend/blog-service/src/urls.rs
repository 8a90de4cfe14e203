/// URL builders for every page the service links or redirects to.
///
/// Handlers, templates (through the context) and tests all build paths
/// here so the route table in `routes.rs` stays the single source of shape.
use uuid::Uuid;

pub const LOGIN: &str = "/auth/login/";
pub const LOGOUT: &str = "/auth/logout/";
pub const REGISTRATION: &str = "/auth/registration/";
pub const EDIT_PROFILE: &str = "/edit_profile/";
pub const POST_CREATE: &str = "/posts/create/";

pub fn index() -> String {
    "/".to_string()
}

pub fn post_detail(post_id: Uuid) -> String {
    format!("/posts/{}/", post_id)
}

pub fn post_edit(post_id: Uuid) -> String {
    format!("/posts/{}/edit/", post_id)
}

pub fn post_delete(post_id: Uuid) -> String {
    format!("/posts/{}/delete/", post_id)
}

pub fn comment_create(post_id: Uuid) -> String {
    format!("/posts/{}/comment/", post_id)
}

pub fn comment_edit(post_id: Uuid, comment_id: Uuid) -> String {
    format!("/posts/{}/edit_comment/{}/", post_id, comment_id)
}

pub fn comment_delete(post_id: Uuid, comment_id: Uuid) -> String {
    format!("/posts/{}/delete_comment/{}/", post_id, comment_id)
}

pub fn category(slug: &str) -> String {
    format!("/category/{}/", urlencoding::encode(slug))
}

pub fn profile(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub fn login_with_next(next: &str) -> String {
    format!("{}?next={}", LOGIN, urlencoding::encode(next))
}

/// Only same-site absolute paths are followed after login
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let id = Uuid::nil();
        assert_eq!(
            post_detail(id),
            "/posts/00000000-0000-0000-0000-000000000000/"
        );
        assert_eq!(
            comment_edit(id, id),
            "/posts/00000000-0000-0000-0000-000000000000/edit_comment/00000000-0000-0000-0000-000000000000/"
        );
        assert_eq!(category("travel"), "/category/travel/");
        assert_eq!(profile("leo.t"), "/profile/leo.t/");
        assert_eq!(profile("a+b@c"), "/profile/a%2Bb%40c/");
    }

    #[test]
    fn test_login_with_next_encodes() {
        assert_eq!(
            login_with_next("/posts/1/comment/"),
            "/auth/login/?next=%2Fposts%2F1%2Fcomment%2F"
        );
    }

    #[test]
    fn test_safe_next() {
        assert!(is_safe_next("/profile/leo/"));
        assert!(!is_safe_next("//evil.example/"));
        assert!(!is_safe_next("https://evil.example/"));
        assert!(!is_safe_next("/\\evil.example"));
        assert!(!is_safe_next(""));
    }
}
