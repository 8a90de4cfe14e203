/// HTTP middleware for blog-service
///
/// - `SessionAuth`: reads the session cookie and, when its token validates,
///   stores a [`SessionUser`] in request extensions. It never rejects; pages
///   that need a login use the [`CurrentUser`] extractor instead.
/// - `MetricsMiddleware`: per-route request counters and latency.
pub mod permissions;

pub use permissions::*;

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use crypto_core::jwt;
use futures_util::future::LocalBoxFuture;
use serde::Serialize;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::time::Instant;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AppError;
use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

// =====================================================================
// Session authentication
// =====================================================================

/// Identity carried by a valid session cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub username: String,
}

/// Resolve the session cookie value to a user, if the token is valid
pub fn session_user_from_token(token: &str) -> Option<SessionUser> {
    let data = jwt::validate_token(token).ok()?;
    let id = Uuid::parse_str(&data.claims.sub).ok()?;
    Some(SessionUser {
        id,
        username: data.claims.username,
    })
}

pub struct SessionAuth {
    cookie_name: Rc<str>,
}

impl SessionAuth {
    pub fn new(cookie_name: &str) -> Self {
        Self {
            cookie_name: Rc::from(cookie_name),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthService {
            service: Rc::new(service),
            cookie_name: self.cookie_name.clone(),
        }))
    }
}

pub struct SessionAuthService<S> {
    service: Rc<S>,
    cookie_name: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for SessionAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(cookie) = req.cookie(&self.cookie_name) {
            match session_user_from_token(cookie.value()) {
                Some(user) => {
                    req.extensions_mut().insert(user);
                }
                None => tracing::debug!("ignoring invalid session cookie"),
            }
        }

        let service = self.service.clone();
        Box::pin(async move { service.call(req).await })
    }
}

/// Session cookie carrying `token`
pub fn session_cookie(auth: &AuthConfig, token: String) -> Cookie<'static> {
    Cookie::build(auth.session_cookie_name.clone(), token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(auth.cookie_secure)
        .max_age(CookieDuration::hours(auth.session_ttl_hours))
        .finish()
}

/// Expired cookie that makes the browser drop the session
pub fn cleared_session_cookie(auth: &AuthConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build(auth.session_cookie_name.clone(), "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(auth.cookie_secure)
        .finish();
    cookie.make_removal();
    cookie
}

/// Logged-in user; anonymous requests are redirected to the login page
/// with the requested path as `next`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<SessionUser>()
                .cloned()
                .map(CurrentUser)
                .ok_or_else(|| AppError::LoginRequired {
                    next: requested_path(req),
                }),
        )
    }
}

/// Logged-in user if any
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<SessionUser>);

impl Viewer {
    pub fn id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|u| u.id)
    }
}

impl FromRequest for Viewer {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        ready(Ok(Viewer(req.extensions().get::<SessionUser>().cloned())))
    }
}

fn requested_path(req: &HttpRequest) -> String {
    match req.uri().path_and_query() {
        Some(pq) => pq.as_str().to_string(),
        None => req.path().to_string(),
    }
}

// =====================================================================
// Metrics middleware
// =====================================================================

pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct MetricsMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for MetricsMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let method = req.method().to_string();
        let start = Instant::now();

        Box::pin(async move {
            let res = service.call(req).await?;
            let elapsed = start.elapsed();
            // Route patterns keep label cardinality bounded
            let route = res
                .request()
                .match_pattern()
                .unwrap_or_else(|| "unmatched".to_string());
            let status = res.status().as_u16().to_string();

            HTTP_REQUESTS_TOTAL
                .with_label_values(&[&method, &route, &status])
                .inc();
            HTTP_REQUEST_DURATION_SECONDS
                .with_label_values(&[&method, &route])
                .observe(elapsed.as_secs_f64());
            tracing::debug!(%method, %route, %status, elapsed_ms = elapsed.as_millis() as u64, "request completed");

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App, HttpResponse};

    async fn whoami(viewer: Viewer) -> HttpResponse {
        match viewer.0 {
            Some(user) => HttpResponse::Ok().body(user.username),
            None => HttpResponse::Ok().body("anonymous"),
        }
    }

    async fn private(user: CurrentUser) -> HttpResponse {
        HttpResponse::Ok().body(user.0.username)
    }

    #[actix_web::test]
    async fn test_session_cookie_identifies_viewer() {
        crypto_core::testing::init_test_keys();
        let user_id = Uuid::new_v4();
        let token =
            jwt::generate_session_token(user_id, "leo", chrono::Duration::hours(1)).unwrap();

        let app = test::init_service(
            App::new()
                .wrap(SessionAuth::new("blog_session"))
                .route("/whoami", web::get().to(whoami)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/whoami")
            .cookie(Cookie::new("blog_session", token))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, web::Bytes::from_static(b"leo"));

        let req = test::TestRequest::get()
            .uri("/whoami")
            .cookie(Cookie::new("blog_session", "garbage"))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, web::Bytes::from_static(b"anonymous"));
    }

    #[actix_web::test]
    async fn test_current_user_redirects_anonymous_to_login() {
        let app = test::init_service(
            App::new()
                .wrap(SessionAuth::new("blog_session"))
                .route("/private/", web::get().to(private)),
        )
        .await;

        let req = test::TestRequest::get().uri("/private/?tab=2").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::FOUND);
        let location = resp.headers().get("location").unwrap().to_str().unwrap();
        assert_eq!(location, "/auth/login/?next=%2Fprivate%2F%3Ftab%3D2");
    }

    #[actix_web::test]
    async fn test_session_cookie_flags() {
        let auth = AuthConfig::default();
        let cookie = session_cookie(&auth, "tok".into());
        assert_eq!(cookie.name(), "blog_session");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));

        let cleared = cleared_session_cookie(&auth);
        assert_eq!(cleared.value(), "");
        assert_eq!(cleared.max_age(), Some(CookieDuration::ZERO));
    }
}
