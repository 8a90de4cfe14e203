/// Staff screens over categories, locations, posts and comments
///
/// Every handler requires a logged-in staff account: anonymous requests go
/// to the login page, other users get 403.
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::redirect;
use crate::db::post_repo::PostFilter;
use crate::db::{category_repo, comment_repo, is_unique_violation, location_repo, post_repo};
use crate::error::{AppError, Result};
use crate::forms::{
    parse_datetime_local, CategoryForm, FormErrors, LocationForm, PostFlagsForm, PublishToggle,
};
use crate::metrics::record_mutation;
use crate::middleware::CurrentUser;
use crate::models::{Category, CommentView, PostScope};
use crate::pagination::{Page, PageQuery, PageWindow};
use crate::state::AppState;

const CATEGORIES_URL: &str = "/admin/categories/";
const LOCATIONS_URL: &str = "/admin/locations/";
const POSTS_URL: &str = "/admin/posts/";
const COMMENTS_URL: &str = "/admin/comments/";

#[derive(Serialize)]
struct CategoryRow<'a> {
    #[serde(flatten)]
    category: &'a Category,
    label: String,
}

#[derive(Serialize)]
struct CommentRow<'a> {
    #[serde(flatten)]
    comment: &'a CommentView,
    excerpt: String,
}

async fn require_staff(state: &AppState, user: &CurrentUser) -> Result<()> {
    state.accounts().require_staff(&user.0).await.map(|_| ())
}

fn ensure_touched(rows: u64, what: &str, id: Uuid) -> Result<()> {
    if rows == 0 {
        Err(AppError::not_found(format!("{} {}", what, id)))
    } else {
        Ok(())
    }
}

/// GET /admin/
pub async fn dashboard(user: CurrentUser, state: web::Data<AppState>) -> Result<HttpResponse> {
    require_staff(&state, &user).await?;
    let ctx = state.templates.context(Some(&user.0));
    state.templates.page("admin/index.html", &ctx)
}

// ---------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------

async fn render_categories(
    state: &AppState,
    user: &CurrentUser,
    form: &CategoryForm,
    errors: &FormErrors,
) -> Result<HttpResponse> {
    let categories = category_repo::list_categories(&state.pool).await?;
    let rows: Vec<CategoryRow<'_>> = categories
        .iter()
        .map(|category| CategoryRow {
            category,
            label: category.label(),
        })
        .collect();

    let mut ctx = state.templates.context(Some(&user.0));
    ctx.insert("categories", &rows);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    state.templates.page("admin/categories.html", &ctx)
}

/// GET /admin/categories/
pub async fn list_categories(user: CurrentUser, state: web::Data<AppState>) -> Result<HttpResponse> {
    require_staff(&state, &user).await?;
    let form = CategoryForm {
        is_published: Some("on".into()),
        ..CategoryForm::default()
    };
    render_categories(&state, &user, &form, &FormErrors::default()).await
}

/// POST /admin/categories/
pub async fn create_category(
    user: CurrentUser,
    state: web::Data<AppState>,
    form: web::Form<CategoryForm>,
) -> Result<HttpResponse> {
    require_staff(&state, &user).await?;
    let mut form = form.into_inner();
    form.title = form.title.trim().to_string();
    form.description = form.description.trim().to_string();
    form.slug = form.slug.trim().to_string();

    let mut errors = form.validate_fields();
    if errors.is_empty() {
        match category_repo::create_category(
            &state.pool,
            &form.title,
            &form.description,
            &form.slug,
            form.published(),
        )
        .await
        {
            Ok(category) => {
                tracing::info!(category_id = %category.id, slug = %category.slug, "category created");
                record_mutation("category", "create");
                return Ok(redirect(CATEGORIES_URL));
            }
            Err(err) if is_unique_violation(&err) => {
                errors.add("slug", "Категория с таким идентификатором уже существует.");
            }
            Err(err) => return Err(err.into()),
        }
    }

    render_categories(&state, &user, &form, &errors).await
}

/// POST /admin/categories/{id}/publish/
pub async fn publish_category(
    user: CurrentUser,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    form: web::Form<PublishToggle>,
) -> Result<HttpResponse> {
    require_staff(&state, &user).await?;
    let id = id.into_inner();
    let rows = category_repo::set_published(&state.pool, id, form.is_published).await?;
    ensure_touched(rows, "category", id)?;
    tracing::info!(category_id = %id, is_published = form.is_published, "category visibility changed");
    record_mutation("category", "update");
    Ok(redirect(CATEGORIES_URL))
}

/// POST /admin/categories/{id}/delete/
pub async fn delete_category(
    user: CurrentUser,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    require_staff(&state, &user).await?;
    let id = id.into_inner();
    let rows = category_repo::delete_category(&state.pool, id).await?;
    ensure_touched(rows, "category", id)?;
    tracing::info!(category_id = %id, "category deleted");
    record_mutation("category", "delete");
    Ok(redirect(CATEGORIES_URL))
}

// ---------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------

async fn render_locations(
    state: &AppState,
    user: &CurrentUser,
    form: &LocationForm,
    errors: &FormErrors,
) -> Result<HttpResponse> {
    let locations = location_repo::list_locations(&state.pool).await?;

    let mut ctx = state.templates.context(Some(&user.0));
    ctx.insert("locations", &locations);
    ctx.insert("form", form);
    ctx.insert("errors", errors);
    state.templates.page("admin/locations.html", &ctx)
}

/// GET /admin/locations/
pub async fn list_locations(user: CurrentUser, state: web::Data<AppState>) -> Result<HttpResponse> {
    require_staff(&state, &user).await?;
    let form = LocationForm {
        is_published: Some("on".into()),
        ..LocationForm::default()
    };
    render_locations(&state, &user, &form, &FormErrors::default()).await
}

/// POST /admin/locations/
pub async fn create_location(
    user: CurrentUser,
    state: web::Data<AppState>,
    form: web::Form<LocationForm>,
) -> Result<HttpResponse> {
    require_staff(&state, &user).await?;
    let mut form = form.into_inner();
    form.name = form.name.trim().to_string();

    let errors = form.validate_fields();
    if !errors.is_empty() {
        return render_locations(&state, &user, &form, &errors).await;
    }

    let location = location_repo::create_location(&state.pool, &form.name, form.published()).await?;
    tracing::info!(location_id = %location.id, "location created");
    record_mutation("location", "create");
    Ok(redirect(LOCATIONS_URL))
}

/// POST /admin/locations/{id}/publish/
pub async fn publish_location(
    user: CurrentUser,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    form: web::Form<PublishToggle>,
) -> Result<HttpResponse> {
    require_staff(&state, &user).await?;
    let id = id.into_inner();
    let rows = location_repo::set_published(&state.pool, id, form.is_published).await?;
    ensure_touched(rows, "location", id)?;
    tracing::info!(location_id = %id, is_published = form.is_published, "location visibility changed");
    record_mutation("location", "update");
    Ok(redirect(LOCATIONS_URL))
}

/// POST /admin/locations/{id}/delete/
pub async fn delete_location(
    user: CurrentUser,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    require_staff(&state, &user).await?;
    let id = id.into_inner();
    let rows = location_repo::delete_location(&state.pool, id).await?;
    ensure_touched(rows, "location", id)?;
    tracing::info!(location_id = %id, "location deleted");
    record_mutation("location", "delete");
    Ok(redirect(LOCATIONS_URL))
}

// ---------------------------------------------------------------------
// Posts
// ---------------------------------------------------------------------

/// GET /admin/posts/
pub async fn list_posts(
    user: CurrentUser,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    require_staff(&state, &user).await?;
    let page = state
        .posts()
        .list_page(PostScope::All, Utc::now(), PostFilter::default(), query.page.as_deref())
        .await?;

    let mut ctx = state.templates.context(Some(&user.0));
    ctx.insert("page", &page);
    state.templates.page("admin/posts.html", &ctx)
}

/// POST /admin/posts/{id}/
pub async fn update_post_flags(
    user: CurrentUser,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    form: web::Form<PostFlagsForm>,
) -> Result<HttpResponse> {
    require_staff(&state, &user).await?;
    let id = id.into_inner();
    let pub_date = parse_datetime_local(&form.pub_date)
        .ok_or_else(|| AppError::BadRequest(format!("invalid pub_date {:?}", form.pub_date)))?;
    let is_published = form.is_published.is_some();

    let rows = post_repo::update_post_flags(&state.pool, id, pub_date, is_published).await?;
    ensure_touched(rows, "post", id)?;
    tracing::info!(post_id = %id, %pub_date, is_published, "post flags updated by staff");
    record_mutation("post", "update");
    Ok(redirect(POSTS_URL))
}

// ---------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------

/// GET /admin/comments/
pub async fn list_comments(
    user: CurrentUser,
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    require_staff(&state, &user).await?;
    let total = comment_repo::count_all(&state.pool).await?;
    let window = PageWindow::resolve(query.page.as_deref(), total);
    let comments = comment_repo::list_recent(&state.pool, window.limit(), window.offset()).await?;
    let rows: Vec<CommentRow<'_>> = comments
        .iter()
        .map(|comment| CommentRow {
            comment,
            excerpt: comment.excerpt(),
        })
        .collect();
    let page = Page::new(rows, window);

    let mut ctx = state.templates.context(Some(&user.0));
    ctx.insert("page", &page);
    state.templates.page("admin/comments.html", &ctx)
}

/// POST /admin/comments/{id}/delete/
pub async fn delete_comment(
    user: CurrentUser,
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    require_staff(&state, &user).await?;
    let id = id.into_inner();
    let rows = comment_repo::delete_comment(&state.pool, id).await?;
    ensure_touched(rows, "comment", id)?;
    tracing::info!(comment_id = %id, "comment deleted by staff");
    record_mutation("comment", "delete");
    Ok(redirect(COMMENTS_URL))
}
