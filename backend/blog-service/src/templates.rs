/// Tera page rendering
///
/// Every page context starts from [`Templates::context`], which carries the
/// viewer (for the header and owner-only links) and the media URL prefix.
use actix_web::HttpResponse;
use anyhow::Context as _;
use std::path::Path;
use std::sync::Arc;
use tera::{Context, Tera};

use crate::error::Result;
use crate::middleware::SessionUser;

#[derive(Clone)]
pub struct Templates {
    tera: Arc<Tera>,
    media_url: String,
}

impl Templates {
    /// Load every `*.html` under `dir`
    pub fn load(dir: &Path, media_url: &str) -> anyhow::Result<Self> {
        let pattern = format!("{}/**/*.html", dir.display());
        let tera = Tera::new(&pattern)
            .with_context(|| format!("failed to load templates from {}", dir.display()))?;
        tracing::info!(templates = tera.get_template_names().count(), dir = %dir.display(), "templates loaded");

        Ok(Self {
            tera: Arc::new(tera),
            media_url: media_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn context(&self, viewer: Option<&SessionUser>) -> Context {
        let mut ctx = Context::new();
        ctx.insert("viewer", &viewer);
        ctx.insert("media_url", &self.media_url);
        ctx
    }

    pub fn render(&self, name: &str, ctx: &Context) -> Result<String> {
        Ok(self.tera.render(name, ctx)?)
    }

    /// 200 HTML response
    pub fn page(&self, name: &str, ctx: &Context) -> Result<HttpResponse> {
        let body = self.render(name, ctx)?;
        Ok(HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_template_dir;
    use uuid::Uuid;

    #[test]
    fn test_templates_load() {
        let templates = Templates::load(&default_template_dir(), "/media/").expect("templates parse");
        assert_eq!(templates.media_url, "/media");
        for name in [
            "base.html",
            "blog/index.html",
            "blog/detail.html",
            "blog/create.html",
            "blog/comment.html",
            "blog/category.html",
            "blog/profile.html",
            "blog/user.html",
            "registration/login.html",
            "registration/registration_form.html",
            "admin/index.html",
        ] {
            assert!(
                templates.tera.get_template_names().any(|n| n == name),
                "missing template {}",
                name
            );
        }
    }

    #[test]
    fn test_login_page_renders_for_anonymous() {
        let templates = Templates::load(&default_template_dir(), "/media").unwrap();
        let mut ctx = templates.context(None);
        ctx.insert("form", &crate::forms::LoginForm::default());
        ctx.insert("errors", &crate::forms::FormErrors::default());
        ctx.insert("non_field_error", &Option::<String>::None);

        let html = templates.render("registration/login.html", &ctx).unwrap();
        assert!(html.contains("name=\"username\""));
        assert!(html.contains("/auth/registration/"));
    }

    #[test]
    fn test_header_shows_viewer() {
        let templates = Templates::load(&default_template_dir(), "/media").unwrap();
        let viewer = SessionUser {
            id: Uuid::new_v4(),
            username: "leo".into(),
        };
        let mut ctx = templates.context(Some(&viewer));
        ctx.insert("form", &crate::forms::LoginForm::default());
        ctx.insert("errors", &crate::forms::FormErrors::default());
        ctx.insert("non_field_error", &Option::<String>::None);

        let html = templates.render("registration/login.html", &ctx).unwrap();
        assert!(html.contains("/profile/leo/"));
    }
}
