/// Business logic layer for blog-service
///
/// - `posts`: listings, detail resolution, ownership-gated post writes
/// - `comments`: comment listing and ownership-gated comment writes
/// - `accounts`: registration, login, profile edits and staff checks
pub mod accounts;
pub mod comments;
pub mod posts;

pub use accounts::AccountService;
pub use comments::CommentService;
pub use posts::PostService;
