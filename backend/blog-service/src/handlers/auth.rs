/// Login, logout and registration
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::{redirect, redirect_with_cookie};
use crate::error::Result;
use crate::forms::{FormErrors, LoginForm, RegistrationForm, Submitted};
use crate::middleware::{cleared_session_cookie, session_cookie, Viewer};
use crate::services::accounts::{issue_session_token, login_redirect};
use crate::state::AppState;
use crate::urls;

const INVALID_LOGIN: &str =
    "Пожалуйста, введите правильные имя пользователя и пароль. Оба поля могут быть чувствительны к регистру.";

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

fn render_login(
    state: &AppState,
    viewer: &Viewer,
    form: &LoginForm,
    errors: &FormErrors,
    non_field_error: Option<&str>,
) -> Result<HttpResponse> {
    let mut ctx = state.templates.context(viewer.0.as_ref());
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    ctx.insert("non_field_error", &non_field_error);
    state.templates.page("registration/login.html", &ctx)
}

/// GET /auth/login/
pub async fn login_form(
    state: web::Data<AppState>,
    viewer: Viewer,
    query: web::Query<NextQuery>,
) -> Result<HttpResponse> {
    let form = LoginForm {
        next: query.into_inner().next,
        ..LoginForm::default()
    };
    render_login(&state, &viewer, &form, &FormErrors::default(), None)
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    viewer: Viewer,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let errors = form.validate_fields();
    if !errors.is_empty() {
        return render_login(&state, &viewer, &form, &errors, None);
    }

    let Some(user) = state
        .accounts()
        .authenticate(&form.username, &form.password)
        .await?
    else {
        tracing::info!(username = %form.username, "failed login attempt");
        return render_login(&state, &viewer, &form, &errors, Some(INVALID_LOGIN));
    };

    let token = issue_session_token(&user, state.auth.session_ttl_hours)?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(redirect_with_cookie(
        login_redirect(form.next.as_deref(), &user),
        session_cookie(&state.auth, token),
    ))
}

/// POST /auth/logout/
pub async fn logout(state: web::Data<AppState>, viewer: Viewer) -> HttpResponse {
    if let Some(user) = &viewer.0 {
        tracing::info!(user_id = %user.id, "user logged out");
    }
    redirect_with_cookie(urls::index(), cleared_session_cookie(&state.auth))
}

fn render_registration(
    state: &AppState,
    viewer: &Viewer,
    form: &RegistrationForm,
    errors: &FormErrors,
) -> Result<HttpResponse> {
    let mut ctx = state.templates.context(viewer.0.as_ref());
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    state.templates.page("registration/registration_form.html", &ctx)
}

/// GET /auth/registration/
pub async fn registration_form(state: web::Data<AppState>, viewer: Viewer) -> Result<HttpResponse> {
    render_registration(&state, &viewer, &RegistrationForm::default(), &FormErrors::default())
}

/// POST /auth/registration/
pub async fn register(
    state: web::Data<AppState>,
    viewer: Viewer,
    form: web::Form<RegistrationForm>,
) -> Result<HttpResponse> {
    let mut form = form.into_inner();
    form.username = form.username.trim().to_string();
    form.email = form.email.trim().to_string();

    match state.accounts().register(&form).await? {
        Submitted::Saved(_) => Ok(redirect(urls::LOGIN)),
        Submitted::Invalid(errors) => render_registration(&state, &viewer, &form, &errors),
    }
}
