/// Route table
///
/// Fixed segments (`/posts/create/`) are registered before the
/// `{post_id}` patterns they would otherwise collide with.
use actix_files::Files;
use actix_web::web;

use crate::handlers::{admin, auth, categories, comments, health, posts, profiles};
use crate::metrics::serve_metrics;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health))
        .route("/health/live", web::get().to(health::liveness))
        .route("/metrics", web::get().to(serve_metrics))
        .route("/", web::get().to(posts::index))
        .service(
            web::resource("/posts/create/")
                .route(web::get().to(posts::create_post_form))
                .route(web::post().to(posts::create_post)),
        )
        .route("/posts/{post_id}/", web::get().to(posts::post_detail))
        .service(
            web::resource("/posts/{post_id}/edit/")
                .route(web::get().to(posts::edit_post_form))
                .route(web::post().to(posts::edit_post)),
        )
        .service(
            web::resource("/posts/{post_id}/delete/")
                .route(web::get().to(posts::delete_post_form))
                .route(web::post().to(posts::delete_post)),
        )
        .service(
            web::resource("/posts/{post_id}/comment/")
                .route(web::get().to(comments::add_comment_form))
                .route(web::post().to(comments::add_comment)),
        )
        .service(
            web::resource("/posts/{post_id}/edit_comment/{comment_id}/")
                .route(web::get().to(comments::edit_comment_form))
                .route(web::post().to(comments::edit_comment)),
        )
        .service(
            web::resource("/posts/{post_id}/delete_comment/{comment_id}/")
                .route(web::get().to(comments::delete_comment_form))
                .route(web::post().to(comments::delete_comment)),
        )
        .route(
            "/category/{category_slug}/",
            web::get().to(categories::category_posts),
        )
        .route("/profile/{username}/", web::get().to(profiles::profile))
        .service(
            web::resource("/edit_profile/")
                .route(web::get().to(profiles::edit_profile_form))
                .route(web::post().to(profiles::edit_profile)),
        )
        .service(
            web::scope("/auth")
                .service(
                    web::resource("/login/")
                        .route(web::get().to(auth::login_form))
                        .route(web::post().to(auth::login)),
                )
                .route("/logout/", web::post().to(auth::logout))
                .service(
                    web::resource("/registration/")
                        .route(web::get().to(auth::registration_form))
                        .route(web::post().to(auth::register)),
                ),
        )
        .service(
            web::scope("/admin")
                .route("/", web::get().to(admin::dashboard))
                .service(
                    web::resource("/categories/")
                        .route(web::get().to(admin::list_categories))
                        .route(web::post().to(admin::create_category)),
                )
                .route("/categories/{id}/publish/", web::post().to(admin::publish_category))
                .route("/categories/{id}/delete/", web::post().to(admin::delete_category))
                .service(
                    web::resource("/locations/")
                        .route(web::get().to(admin::list_locations))
                        .route(web::post().to(admin::create_location)),
                )
                .route("/locations/{id}/publish/", web::post().to(admin::publish_location))
                .route("/locations/{id}/delete/", web::post().to(admin::delete_location))
                .route("/posts/", web::get().to(admin::list_posts))
                .route("/posts/{id}/", web::post().to(admin::update_post_flags))
                .route("/comments/", web::get().to(admin::list_comments))
                .route("/comments/{id}/delete/", web::post().to(admin::delete_comment)),
        );
}

/// Uploaded images under the configured media root
pub fn media_files(url_prefix: &str, root: &std::path::Path) -> Files {
    Files::new(url_prefix, root)
}
