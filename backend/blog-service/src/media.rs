/// Post image uploads
///
/// The post form is multipart: text fields are collected into a map and the
/// optional `image` part is buffered (bounded by `max_upload_bytes`) and
/// checked to be JPEG, PNG, GIF or WEBP. Accepted images are written under
/// `<media root>/post_images/` and referenced from the post by relative path.
use actix_multipart::Multipart;
use futures_util::stream::StreamExt;
use std::collections::HashMap;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::error::{AppError, Result};

const IMAGE_FIELD: &str = "image";
const IMAGE_DIR: &str = "post_images";
/// Upper bound for all text fields of one form together
const MAX_TEXT_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageKind {
    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Gif => "gif",
            ImageKind::Webp => "webp",
        }
    }

    /// Sniff the format from the leading bytes
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageKind::Jpeg)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(ImageKind::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(ImageKind::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(ImageKind::Webp)
        } else {
            None
        }
    }

    fn matches_mime(self, content_type: &mime::Mime) -> bool {
        if content_type.type_() != mime::IMAGE {
            return false;
        }
        match self {
            ImageKind::Jpeg => content_type.subtype() == mime::JPEG,
            ImageKind::Png => content_type.subtype() == mime::PNG,
            ImageKind::Gif => content_type.subtype() == mime::GIF,
            ImageKind::Webp => content_type.subtype().as_str() == "webp",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub kind: ImageKind,
    pub bytes: Vec<u8>,
}

/// A parsed multipart form
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub image: Option<UploadedImage>,
    /// Set when an image part was sent but rejected
    pub image_error: Option<String>,
}

/// Read the whole multipart body
pub async fn read_multipart(mut payload: Multipart, max_image_bytes: usize) -> Result<MultipartForm> {
    let mut form = MultipartForm::default();
    let mut text_bytes = 0usize;

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let name = field.name().unwrap_or_default().to_string();
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(|f| f.to_string());
        let content_type = field.content_type().cloned();

        if name == IMAGE_FIELD {
            let mut data = Vec::new();
            let mut too_large = false;
            while let Some(chunk) = field.next().await {
                let chunk = chunk?;
                if too_large {
                    continue;
                }
                if data.len() + chunk.len() > max_image_bytes {
                    too_large = true;
                    data.clear();
                    continue;
                }
                data.extend_from_slice(&chunk);
            }

            // An empty file input still sends a part with no filename
            if filename.as_deref().map(str::is_empty).unwrap_or(true) && data.is_empty() && !too_large {
                continue;
            }

            if too_large {
                form.image_error = Some(format!(
                    "Размер изображения не может превышать {} байт.",
                    max_image_bytes
                ));
                continue;
            }

            match ImageKind::detect(&data) {
                Some(kind)
                    if content_type
                        .as_ref()
                        .map(|ct| kind.matches_mime(ct) || ct == &mime::APPLICATION_OCTET_STREAM)
                        .unwrap_or(true) =>
                {
                    form.image = Some(UploadedImage { kind, bytes: data });
                }
                _ => {
                    form.image_error = Some(
                        "Загрузите правильное изображение. Файл, который вы загрузили, поврежден или не является изображением."
                            .to_string(),
                    );
                }
            }
            continue;
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk?;
            text_bytes += chunk.len();
            if text_bytes > MAX_TEXT_BYTES {
                return Err(AppError::PayloadTooLarge("form fields".into()));
            }
            data.extend_from_slice(&chunk);
        }
        form.fields
            .insert(name, String::from_utf8_lossy(&data).into_owned());
    }

    Ok(form)
}

/// Filesystem store for uploaded media
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
    max_upload_bytes: usize,
}

impl MediaStore {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            root: config.root.clone(),
            url_prefix: config.url_prefix.trim_end_matches('/').to_string(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Write the image and return its path relative to the root
    pub async fn save_post_image(&self, image: &UploadedImage) -> Result<String> {
        let relative = format!("{}/{}.{}", IMAGE_DIR, Uuid::new_v4(), image.kind.extension());
        let dir = self.root.join(IMAGE_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(self.root.join(&relative), &image.bytes).await?;

        tracing::debug!(path = %relative, bytes = image.bytes.len(), "stored post image");
        Ok(relative)
    }

    /// Best effort; a missing file is not an error
    pub async fn remove(&self, relative: &str) {
        if relative.is_empty() || !is_contained(relative) {
            return;
        }
        let path = self.root.join(relative);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %relative, "removed post image"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %relative, error = %e, "failed to remove post image"),
        }
    }

    /// Await `write`; when it fails, remove `fresh`, an image stored for this
    /// write that nothing references yet. An empty `fresh` is ignored.
    pub async fn discard_on_error<T, F>(&self, fresh: &str, write: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match write.await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::debug!(path = %fresh, error = %e, "discarding image of failed write");
                self.remove(fresh).await;
                Err(e)
            }
        }
    }

    pub fn url(&self, relative: &str) -> String {
        format!("{}/{}", self.url_prefix, relative)
    }
}

fn is_contained(relative: &str) -> bool {
    Path::new(relative)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}
