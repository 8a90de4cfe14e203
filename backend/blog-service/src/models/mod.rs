/// Data models for blog-service
///
/// - `User`: account owning posts and comments
/// - `Category` / `Location`: publishable groupings a post may reference
/// - `PostView`: a post joined with its author, category, location and
///   comment count, as every read scope returns it
/// - `CommentView`: a comment joined with its author
pub mod category;
pub mod comment;
pub mod post;
pub mod user;

pub use category::{Category, Location};
pub use comment::CommentView;
pub use post::{PostChanges, PostScope, PostView};
pub use user::{ProfileChanges, User};
