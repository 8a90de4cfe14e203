/// Post pages: index, detail, create, edit and delete
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

use super::redirect;
use crate::error::Result;
use crate::forms::{CommentForm, FormErrors, PostForm};
use crate::media::read_multipart;
use crate::middleware::{CurrentUser, Gate, SessionUser, Viewer};
use crate::models::{PostChanges, PostView};
use crate::pagination::PageQuery;
use crate::state::AppState;
use crate::urls;

const POST_FORM_TEMPLATE: &str = "blog/create.html";

#[derive(Clone, Copy, PartialEq, Eq)]
enum FormMode {
    Create,
    Edit,
    Delete,
}

impl FormMode {
    fn as_str(self) -> &'static str {
        match self {
            FormMode::Create => "create",
            FormMode::Edit => "edit",
            FormMode::Delete => "delete",
        }
    }
}

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    viewer: Viewer,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let page = state
        .posts()
        .index_page(Utc::now(), query.page.as_deref())
        .await?;

    let mut ctx = state.templates.context(viewer.0.as_ref());
    ctx.insert("page", &page);
    state.templates.page("blog/index.html", &ctx)
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    viewer: Viewer,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let now = Utc::now();
    let post = state
        .posts()
        .resolve_detail(post_id.into_inner(), viewer.id(), now)
        .await?;
    let comments = state.comments().list_for_post(post.id).await?;

    let mut ctx = state.templates.context(viewer.0.as_ref());
    ctx.insert("is_owner", &viewer.id().map(|id| post.is_authored_by(id)).unwrap_or(false));
    ctx.insert("is_visible", &post.is_publicly_visible(now));
    ctx.insert("location_name", &post.visible_location_name());
    ctx.insert("post", &post);
    ctx.insert("comments", &comments);
    ctx.insert("form", &CommentForm::default());
    ctx.insert("errors", &FormErrors::default());
    state.templates.page("blog/detail.html", &ctx)
}

async fn render_post_form(
    state: &AppState,
    viewer: &SessionUser,
    mode: FormMode,
    form: &PostForm,
    errors: &FormErrors,
    post: Option<&PostView>,
) -> Result<HttpResponse> {
    let (categories, locations) = state.posts().form_choices().await?;

    let action = match (mode, post) {
        (FormMode::Edit, Some(post)) => urls::post_edit(post.id),
        (FormMode::Delete, Some(post)) => urls::post_delete(post.id),
        _ => urls::POST_CREATE.to_string(),
    };

    let mut ctx = state.templates.context(Some(viewer));
    ctx.insert("mode", mode.as_str());
    ctx.insert("action", &action);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    ctx.insert("categories", &categories);
    ctx.insert("locations", &locations);
    ctx.insert("post", &post);
    state.templates.page(POST_FORM_TEMPLATE, &ctx)
}

/// GET /posts/create/
pub async fn create_post_form(user: CurrentUser, state: web::Data<AppState>) -> Result<HttpResponse> {
    render_post_form(
        &state,
        &user.0,
        FormMode::Create,
        &PostForm::blank(Utc::now()),
        &FormErrors::default(),
        None,
    )
    .await
}

/// POST /posts/create/
pub async fn create_post(
    user: CurrentUser,
    state: web::Data<AppState>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let upload = read_multipart(payload, state.media.max_upload_bytes()).await?;
    let form = PostForm::from_fields(&upload.fields);
    let service = state.posts();

    let (clean, mut errors) = match form.clean() {
        Ok(clean) => (Some(clean), FormErrors::default()),
        Err(errors) => (None, errors),
    };
    if let Some(clean) = &clean {
        service.check_references(clean, &mut errors).await?;
    }
    if let Some(message) = upload.image_error {
        errors.add("image", message);
    }

    let clean = match clean {
        Some(clean) if errors.is_empty() => clean,
        _ => {
            tracing::debug!(user_id = %user.0.id, "post form rejected");
            return render_post_form(&state, &user.0, FormMode::Create, &form, &errors, None).await;
        }
    };

    let image = match &upload.image {
        Some(image) => state.media.save_post_image(image).await?,
        None => String::new(),
    };

    let changes = PostChanges {
        title: clean.title,
        text: clean.text,
        pub_date: clean.pub_date,
        location_id: clean.location_id,
        category_id: Some(clean.category_id),
        image,
    };
    state
        .media
        .discard_on_error(&changes.image, service.create(user.0.id, &changes))
        .await?;

    Ok(redirect(urls::profile(&user.0.username)))
}

/// GET /posts/{post_id}/edit/
pub async fn edit_post_form(
    user: CurrentUser,
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = match state
        .posts()
        .load_for_author(post_id.into_inner(), user.0.id, Utc::now())
        .await?
    {
        Gate::Allowed(post) => post,
        Gate::Redirect(to) => return Ok(redirect(to)),
    };

    render_post_form(
        &state,
        &user.0,
        FormMode::Edit,
        &PostForm::from_post(&post),
        &FormErrors::default(),
        Some(&post),
    )
    .await
}

/// POST /posts/{post_id}/edit/
pub async fn edit_post(
    user: CurrentUser,
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let service = state.posts();
    let post = match service
        .load_for_author(post_id.into_inner(), user.0.id, Utc::now())
        .await?
    {
        Gate::Allowed(post) => post,
        Gate::Redirect(to) => return Ok(redirect(to)),
    };

    let upload = read_multipart(payload, state.media.max_upload_bytes()).await?;
    let form = PostForm::from_fields(&upload.fields);

    let (clean, mut errors) = match form.clean() {
        Ok(clean) => (Some(clean), FormErrors::default()),
        Err(errors) => (None, errors),
    };
    if let Some(clean) = &clean {
        service.check_references(clean, &mut errors).await?;
    }
    if let Some(message) = upload.image_error {
        errors.add("image", message);
    }

    let clean = match clean {
        Some(clean) if errors.is_empty() => clean,
        _ => {
            return render_post_form(&state, &user.0, FormMode::Edit, &form, &errors, Some(&post))
                .await;
        }
    };

    // New upload replaces, "clear" removes, otherwise keep
    let image = match (&upload.image, clean.image_clear) {
        (Some(image), _) => state.media.save_post_image(image).await?,
        (None, true) => String::new(),
        (None, false) => post.image.clone(),
    };

    let changes = PostChanges {
        title: clean.title,
        text: clean.text,
        pub_date: clean.pub_date,
        location_id: clean.location_id,
        category_id: Some(clean.category_id),
        image,
    };
    let fresh = if changes.image != post.image { changes.image.as_str() } else { "" };
    state
        .media
        .discard_on_error(fresh, service.update(post.id, &changes))
        .await?;

    if !post.image.is_empty() && post.image != changes.image {
        state.media.remove(&post.image).await;
    }

    Ok(redirect(urls::post_detail(post.id)))
}

/// GET /posts/{post_id}/delete/
pub async fn delete_post_form(
    user: CurrentUser,
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = match state
        .posts()
        .load_for_author(post_id.into_inner(), user.0.id, Utc::now())
        .await?
    {
        Gate::Allowed(post) => post,
        Gate::Redirect(to) => return Ok(redirect(to)),
    };

    render_post_form(
        &state,
        &user.0,
        FormMode::Delete,
        &PostForm::from_post(&post),
        &FormErrors::default(),
        Some(&post),
    )
    .await
}

/// POST /posts/{post_id}/delete/
pub async fn delete_post(
    user: CurrentUser,
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = state.posts();
    let post = match service
        .load_for_author(post_id.into_inner(), user.0.id, Utc::now())
        .await?
    {
        Gate::Allowed(post) => post,
        Gate::Redirect(to) => return Ok(redirect(to)),
    };

    service.delete(&post, &state.media).await?;
    Ok(redirect(urls::profile(&user.0.username)))
}
