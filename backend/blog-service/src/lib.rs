/// Blog Service Library
///
/// A server-rendered blog: users publish posts under categories and
/// locations, other users comment, and visibility follows publication flags
/// and scheduled publish dates.
///
/// # Modules
///
/// - `handlers`: page handlers (posts, comments, profiles, auth, admin)
/// - `services`: visibility-aware listings, detail resolution, ownership gates
/// - `db`: repositories over PostgreSQL
/// - `models`: row types
/// - `forms`: form input and validation
/// - `middleware`: session authentication, request metrics, ownership checks
/// - `templates` / `media`: Tera rendering and uploaded images
/// - `config` / `error` / `metrics` / `cli`: service plumbing
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod media;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;
pub mod state;
pub mod templates;
pub mod urls;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
