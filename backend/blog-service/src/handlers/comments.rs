/// Comment pages: add, edit and delete
use actix_web::{web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

use super::redirect;
use crate::error::Result;
use crate::forms::{CommentForm, FormErrors};
use crate::middleware::{CurrentUser, Gate, SessionUser};
use crate::models::CommentView;
use crate::state::AppState;
use crate::urls;

const COMMENT_TEMPLATE: &str = "blog/comment.html";

/// Which comment page to render and where it posts to
struct CommentPage<'a> {
    post_id: Uuid,
    action: String,
    comment: Option<&'a CommentView>,
    deleting: bool,
}

fn render_comment_form(
    state: &AppState,
    viewer: &SessionUser,
    page: CommentPage<'_>,
    form: &CommentForm,
    errors: &FormErrors,
) -> Result<HttpResponse> {
    let mut ctx = state.templates.context(Some(viewer));
    ctx.insert("post_url", &urls::post_detail(page.post_id));
    ctx.insert("action", &page.action);
    ctx.insert("comment", &page.comment);
    ctx.insert("deleting", &page.deleting);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    state.templates.page(COMMENT_TEMPLATE, &ctx)
}

type CommentPath = web::Path<(Uuid, Uuid)>;

/// GET /posts/{post_id}/comment/
pub async fn add_comment_form(
    user: CurrentUser,
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = state
        .posts()
        .resolve_detail(post_id.into_inner(), Some(user.0.id), Utc::now())
        .await?;

    render_comment_form(
        &state,
        &user.0,
        CommentPage {
            post_id: post.id,
            action: urls::comment_create(post.id),
            comment: None,
            deleting: false,
        },
        &CommentForm::default(),
        &FormErrors::default(),
    )
}

/// POST /posts/{post_id}/comment/
pub async fn add_comment(
    user: CurrentUser,
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    let post = state
        .posts()
        .resolve_detail(post_id.into_inner(), Some(user.0.id), Utc::now())
        .await?;

    match form.into_inner().clean() {
        Ok(text) => {
            state.comments().create(post.id, user.0.id, &text).await?;
            Ok(redirect(urls::post_detail(post.id)))
        }
        Err((form, errors)) => render_comment_form(
            &state,
            &user.0,
            CommentPage {
                post_id: post.id,
                action: urls::comment_create(post.id),
                comment: None,
                deleting: false,
            },
            &form,
            &errors,
        ),
    }
}

/// GET /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_comment_form(
    user: CurrentUser,
    state: web::Data<AppState>,
    path: CommentPath,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = match state
        .comments()
        .load_for_author(post_id, comment_id, user.0.id)
        .await?
    {
        Gate::Allowed(comment) => comment,
        Gate::Redirect(to) => return Ok(redirect(to)),
    };

    let form = CommentForm {
        text: comment.text.clone(),
    };
    render_comment_form(
        &state,
        &user.0,
        CommentPage {
            post_id,
            action: urls::comment_edit(post_id, comment_id),
            comment: Some(&comment),
            deleting: false,
        },
        &form,
        &FormErrors::default(),
    )
}

/// POST /posts/{post_id}/edit_comment/{comment_id}/
pub async fn edit_comment(
    user: CurrentUser,
    state: web::Data<AppState>,
    path: CommentPath,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let service = state.comments();
    let comment = match service.load_for_author(post_id, comment_id, user.0.id).await? {
        Gate::Allowed(comment) => comment,
        Gate::Redirect(to) => return Ok(redirect(to)),
    };

    match form.into_inner().clean() {
        Ok(text) => {
            service.update(comment.id, &text).await?;
            Ok(redirect(urls::post_detail(post_id)))
        }
        Err((form, errors)) => render_comment_form(
            &state,
            &user.0,
            CommentPage {
                post_id,
                action: urls::comment_edit(post_id, comment_id),
                comment: Some(&comment),
                deleting: false,
            },
            &form,
            &errors,
        ),
    }
}

/// GET /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete_comment_form(
    user: CurrentUser,
    state: web::Data<AppState>,
    path: CommentPath,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let comment = match state
        .comments()
        .load_for_author(post_id, comment_id, user.0.id)
        .await?
    {
        Gate::Allowed(comment) => comment,
        Gate::Redirect(to) => return Ok(redirect(to)),
    };

    render_comment_form(
        &state,
        &user.0,
        CommentPage {
            post_id,
            action: urls::comment_delete(post_id, comment_id),
            comment: Some(&comment),
            deleting: true,
        },
        &CommentForm::default(),
        &FormErrors::default(),
    )
}

/// POST /posts/{post_id}/delete_comment/{comment_id}/
pub async fn delete_comment(
    user: CurrentUser,
    state: web::Data<AppState>,
    path: CommentPath,
) -> Result<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let service = state.comments();
    let comment = match service.load_for_author(post_id, comment_id, user.0.id).await? {
        Gate::Allowed(comment) => comment,
        Gate::Redirect(to) => return Ok(redirect(to)),
    };

    service.delete(comment.id).await?;
    Ok(redirect(urls::post_detail(post_id)))
}
