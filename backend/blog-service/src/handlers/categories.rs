use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::error::Result;
use crate::middleware::Viewer;
use crate::pagination::PageQuery;
use crate::state::AppState;

/// GET /category/{category_slug}/
pub async fn category_posts(
    state: web::Data<AppState>,
    viewer: Viewer,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (category, page) = state
        .posts()
        .category_page(&slug, Utc::now(), query.page.as_deref())
        .await?;

    let mut ctx = state.templates.context(viewer.0.as_ref());
    ctx.insert("category", &category);
    ctx.insert("page", &page);
    state.templates.page("blog/category.html", &ctx)
}
