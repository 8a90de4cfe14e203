/// Shared application state handed to every handler as `web::Data<AppState>`
use sqlx::PgPool;

use crate::config::AuthConfig;
use crate::media::MediaStore;
use crate::services::{AccountService, CommentService, PostService};
use crate::templates::Templates;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub templates: Templates,
    pub media: MediaStore,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn posts(&self) -> PostService {
        PostService::new(self.pool.clone())
    }

    pub fn comments(&self) -> CommentService {
        CommentService::new(self.pool.clone())
    }

    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.pool.clone())
    }
}
