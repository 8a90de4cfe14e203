/// Routing and access control that never reaches the database
mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use blog_service::middleware::SessionAuth;
use blog_service::{routes, urls};
use common::*;
use uuid::Uuid;

macro_rules! init_app {
    () => {{
        let state = app_state(lazy_pool());
        let cookie_name = state.auth.session_cookie_name.clone();
        test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .wrap(SessionAuth::new(&cookie_name))
                .configure(routes::configure),
        )
        .await
    }};
}

fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[actix_web::test]
async fn test_liveness() {
    let app = init_app!();
    let req = test::TestRequest::get().uri("/health/live").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_anonymous_post_create_redirects_to_login() {
    let app = init_app!();
    let req = test::TestRequest::get().uri(urls::POST_CREATE).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=%2Fposts%2Fcreate%2F");
}

#[actix_web::test]
async fn test_anonymous_comment_redirects_to_login() {
    let app = init_app!();
    let post_id = Uuid::new_v4();
    let req = test::TestRequest::post()
        .uri(&urls::comment_create(post_id))
        .set_form([("text", "hello")])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        location(&resp),
        urls::login_with_next(&urls::comment_create(post_id))
    );
}

#[actix_web::test]
async fn test_anonymous_profile_edit_and_admin_redirect() {
    let app = init_app!();
    for uri in [urls::EDIT_PROFILE, "/admin/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND, "{}", uri);
        assert!(location(&resp).starts_with(urls::LOGIN), "{}", uri);
    }
}

#[actix_web::test]
async fn test_login_page_keeps_next() {
    let app = init_app!();
    let req = test::TestRequest::get()
        .uri("/auth/login/?next=%2Fposts%2Fcreate%2F")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("name=\"next\""));
    // Autoescaping turns '/' into "&#x2F;"
    assert!(html.contains("&#x2F;posts&#x2F;create&#x2F;"));
}

#[actix_web::test]
async fn test_registration_page_renders() {
    let app = init_app!();
    let req = test::TestRequest::get().uri(urls::REGISTRATION).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("name=\"password2\""));
}

#[actix_web::test]
async fn test_logout_clears_cookie() {
    let app = init_app!();
    let req = test::TestRequest::post().uri(urls::LOGOUT).to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    let set_cookie = resp
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(set_cookie.starts_with("blogicum_session="));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[actix_web::test]
async fn test_malformed_post_id_is_not_found() {
    let app = init_app!();
    let req = test::TestRequest::get().uri("/posts/not-a-uuid/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
