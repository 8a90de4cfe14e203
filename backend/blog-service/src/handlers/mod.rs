/// HTTP handlers for blog-service pages
///
/// Every page handler renders a Tera template or answers with a 302. GET
/// shows a form, POST processes it; invalid submissions re-render the same
/// template with field errors.
pub mod admin;
pub mod auth;
pub mod categories;
pub mod comments;
pub mod health;
pub mod posts;
pub mod profiles;

use actix_web::cookie::Cookie;
use actix_web::{http::header, HttpResponse};

/// 302 to `location`
pub fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

/// 302 to `location` that also sets `cookie`
pub fn redirect_with_cookie(location: impl AsRef<str>, cookie: Cookie<'_>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .cookie(cookie)
        .finish()
}
