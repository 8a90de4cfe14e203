/// Comment service - listing and author-only writes
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::comment_repo;
use crate::error::{AppError, Result};
use crate::metrics::{record_mutation, record_ownership_refusal};
use crate::middleware::{check_comment_ownership, Gate, Ownership};
use crate::models::CommentView;
use crate::urls;

pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Oldest first
    pub async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>> {
        Ok(comment_repo::list_for_post(&self.pool, post_id).await?)
    }

    /// The caller resolves the post first so hidden posts cannot be commented
    pub async fn create(&self, post_id: Uuid, author_id: Uuid, text: &str) -> Result<Uuid> {
        let comment_id = comment_repo::create_comment(&self.pool, post_id, author_id, text).await?;
        tracing::info!(%comment_id, %post_id, %author_id, "comment created");
        record_mutation("comment", "create");
        Ok(comment_id)
    }

    /// Load a comment of `post_id` for editing or deletion by `user_id`
    pub async fn load_for_author(
        &self,
        post_id: Uuid,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Gate<CommentView>> {
        let comment = comment_repo::find_comment(&self.pool, comment_id)
            .await?
            .filter(|c| c.post_id == post_id)
            .ok_or_else(|| AppError::not_found(format!("comment {}", comment_id)))?;

        match check_comment_ownership(user_id, &comment) {
            Ownership::Owner => Ok(Gate::Allowed(comment)),
            Ownership::Foreign => {
                tracing::info!(%comment_id, %user_id, "refusing change to another author's comment");
                record_ownership_refusal("comment");
                Ok(Gate::Redirect(urls::post_detail(post_id)))
            }
        }
    }

    pub async fn update(&self, comment_id: Uuid, text: &str) -> Result<()> {
        if comment_repo::update_comment(&self.pool, comment_id, text).await? == 0 {
            return Err(AppError::not_found(format!("comment {}", comment_id)));
        }
        tracing::info!(%comment_id, "comment updated");
        record_mutation("comment", "update");
        Ok(())
    }

    pub async fn delete(&self, comment_id: Uuid) -> Result<()> {
        comment_repo::delete_comment(&self.pool, comment_id).await?;
        tracing::info!(%comment_id, "comment deleted");
        record_mutation("comment", "delete");
        Ok(())
    }
}
