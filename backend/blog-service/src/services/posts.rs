/// Post service - listings, detail resolution and author-only writes
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::post_repo::{self, PostFilter};
use crate::db::{category_repo, location_repo, user_repo};
use crate::error::{AppError, Result};
use crate::forms::{CleanPostForm, FormErrors};
use crate::media::MediaStore;
use crate::metrics::{record_mutation, record_ownership_refusal};
use crate::middleware::{check_post_ownership, Gate, Ownership};
use crate::models::{Category, Location, PostChanges, PostScope, PostView, User};
use crate::pagination::{Page, PageWindow};
use crate::urls;

pub struct PostService {
    pool: PgPool,
}

impl PostService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count, clamp the requested page, then fetch that page
    pub async fn list_page(
        &self,
        scope: PostScope,
        now: DateTime<Utc>,
        filter: PostFilter,
        requested_page: Option<&str>,
    ) -> Result<Page<PostView>> {
        let total = post_repo::count_posts(&self.pool, scope, now, filter).await?;
        let window = PageWindow::resolve(requested_page, total);
        let items = post_repo::list_posts(
            &self.pool,
            scope,
            now,
            filter,
            window.limit(),
            window.offset(),
        )
        .await?;

        Ok(Page::new(items, window))
    }

    pub async fn index_page(
        &self,
        now: DateTime<Utc>,
        requested_page: Option<&str>,
    ) -> Result<Page<PostView>> {
        self.list_page(PostScope::Published, now, PostFilter::default(), requested_page)
            .await
    }

    /// Published posts of a published category
    pub async fn category_page(
        &self,
        slug: &str,
        now: DateTime<Utc>,
        requested_page: Option<&str>,
    ) -> Result<(Category, Page<PostView>)> {
        let category = category_repo::find_published_by_slug(&self.pool, slug)
            .await?
            .ok_or_else(|| AppError::not_found(format!("category {}", slug)))?;

        let page = self
            .list_page(
                PostScope::Published,
                now,
                PostFilter::by_category(category.id),
                requested_page,
            )
            .await?;

        Ok((category, page))
    }

    /// The owner sees every post of theirs; everyone else only visible ones
    pub async fn profile_page(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        now: DateTime<Utc>,
        requested_page: Option<&str>,
    ) -> Result<(User, Page<PostView>)> {
        let profile = user_repo::find_by_username(&self.pool, username)
            .await?
            .ok_or_else(|| AppError::not_found(format!("user {}", username)))?;

        let scope = match viewer {
            Some(viewer_id) if viewer_id == profile.id => PostScope::All,
            _ => PostScope::Published,
        };

        let page = self
            .list_page(scope, now, PostFilter::by_author(profile.id), requested_page)
            .await?;

        Ok((profile, page))
    }

    /// Two-branch read: the author gets the post unrestricted, anyone else
    /// gets it only through the published scope.
    pub async fn resolve_detail(
        &self,
        post_id: Uuid,
        viewer: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<PostView> {
        let post = post_repo::find_post(&self.pool, PostScope::All, now, post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))?;

        match viewer {
            Some(viewer_id) if check_post_ownership(viewer_id, &post) == Ownership::Owner => Ok(post),
            _ => post_repo::find_post(&self.pool, PostScope::Published, now, post_id)
                .await?
                .ok_or_else(|| AppError::not_found(format!("post {}", post_id))),
        }
    }

    /// Load a post for editing or deletion by `user_id`
    pub async fn load_for_author(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Gate<PostView>> {
        let post = post_repo::find_post(&self.pool, PostScope::All, now, post_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))?;

        match check_post_ownership(user_id, &post) {
            Ownership::Owner => Ok(Gate::Allowed(post)),
            Ownership::Foreign => {
                tracing::info!(%post_id, %user_id, "refusing change to another author's post");
                record_ownership_refusal("post");
                Ok(Gate::Redirect(urls::post_detail(post_id)))
            }
        }
    }

    /// Categories and locations offered by the post form
    pub async fn form_choices(&self) -> Result<(Vec<Category>, Vec<Location>)> {
        let categories = category_repo::list_categories(&self.pool).await?;
        let locations = location_repo::list_locations(&self.pool).await?;
        Ok((categories, locations))
    }

    /// Referenced category and location must exist
    pub async fn check_references(&self, form: &CleanPostForm, errors: &mut FormErrors) -> Result<()> {
        if category_repo::find_category(&self.pool, form.category_id)
            .await?
            .is_none()
        {
            errors.add("category", "Выберите корректный вариант.");
        }
        if let Some(location_id) = form.location_id {
            if location_repo::find_location(&self.pool, location_id)
                .await?
                .is_none()
            {
                errors.add("location", "Выберите корректный вариант.");
            }
        }
        Ok(())
    }

    pub async fn create(&self, author_id: Uuid, changes: &PostChanges) -> Result<Uuid> {
        let post_id = post_repo::create_post(&self.pool, author_id, changes).await?;
        tracing::info!(%post_id, %author_id, scheduled = changes.pub_date > Utc::now(), "post created");
        record_mutation("post", "create");
        Ok(post_id)
    }

    pub async fn update(&self, post_id: Uuid, changes: &PostChanges) -> Result<()> {
        let updated = post_repo::update_post(&self.pool, post_id, changes).await?;
        if updated == 0 {
            return Err(AppError::not_found(format!("post {}", post_id)));
        }
        tracing::info!(%post_id, "post updated");
        record_mutation("post", "update");
        Ok(())
    }

    /// Delete the post (comments cascade) and then its image file
    pub async fn delete(&self, post: &PostView, media: &MediaStore) -> Result<()> {
        post_repo::delete_post(&self.pool, post.id).await?;
        media.remove(&post.image).await;
        tracing::info!(post_id = %post.id, "post deleted");
        record_mutation("post", "delete");
        Ok(())
    }
}
