/// Profile page and profile editing
use actix_web::{web, HttpResponse};
use chrono::Utc;

use super::{redirect, redirect_with_cookie};
use crate::error::Result;
use crate::forms::{FormErrors, Submitted, UserForm};
use crate::middleware::{session_cookie, CurrentUser, SessionUser, Viewer};
use crate::pagination::PageQuery;
use crate::services::accounts::issue_session_token;
use crate::state::AppState;
use crate::urls;

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    viewer: Viewer,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (profile, page) = state
        .posts()
        .profile_page(&username, viewer.id(), Utc::now(), query.page.as_deref())
        .await?;

    let mut ctx = state.templates.context(viewer.0.as_ref());
    ctx.insert("is_owner", &(viewer.id() == Some(profile.id)));
    ctx.insert("display_name", &profile.display_name());
    ctx.insert("profile", &profile);
    ctx.insert("page", &page);
    state.templates.page("blog/profile.html", &ctx)
}

fn render_user_form(
    state: &AppState,
    viewer: &SessionUser,
    form: &UserForm,
    errors: &FormErrors,
) -> Result<HttpResponse> {
    let mut ctx = state.templates.context(Some(viewer));
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    state.templates.page("blog/user.html", &ctx)
}

/// GET /edit_profile/
pub async fn edit_profile_form(user: CurrentUser, state: web::Data<AppState>) -> Result<HttpResponse> {
    let account = state.accounts().find_user(user.0.id).await?;
    render_user_form(&state, &user.0, &UserForm::from_user(&account), &FormErrors::default())
}

/// POST /edit_profile/
pub async fn edit_profile(
    user: CurrentUser,
    state: web::Data<AppState>,
    form: web::Form<UserForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner().normalized();

    match state.accounts().update_profile(user.0.id, &form).await? {
        Submitted::Saved(account) => {
            let location = urls::profile(&account.username);
            // The session token carries the username
            if account.username != user.0.username {
                let token = issue_session_token(&account, state.auth.session_ttl_hours)?;
                return Ok(redirect_with_cookie(location, session_cookie(&state.auth, token)));
            }
            Ok(redirect(location))
        }
        Submitted::Invalid(errors) => render_user_form(&state, &user.0, &form, &errors),
    }
}
