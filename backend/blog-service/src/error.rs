/// Error types for Blog Service
///
/// Every handler returns `Result<HttpResponse>`; failures are rendered as
/// small HTML pages. `LoginRequired` is not a page but a redirect to the
/// login form carrying the originally requested path.
use actix_web::{error::ResponseError, http::header, http::StatusCode, HttpResponse};
use thiserror::Error;

use crate::urls;

/// Result type for blog-service operations
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Login required")]
    LoginRequired { next: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        AppError::NotFound(what.into())
    }

    fn title(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "Страница не найдена",
            AppError::Forbidden(_) => "Доступ запрещён",
            AppError::BadRequest(_) => "Некорректный запрос",
            AppError::PayloadTooLarge(_) => "Слишком большой файл",
            AppError::LoginRequired { .. } => "Требуется вход",
            AppError::Database(_) | AppError::Template(_) | AppError::Internal(_) => {
                "Ошибка сервера"
            }
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Template(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::LoginRequired { .. } => StatusCode::FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::LoginRequired { next } = self {
            return HttpResponse::Found()
                .insert_header((header::LOCATION, urls::login_with_next(next)))
                .finish();
        }

        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        // Internal detail stays in the log
        let detail = match self {
            AppError::NotFound(_) => "Запрошенная страница не существует или недоступна.",
            AppError::Forbidden(_) => "У вас нет доступа к этой странице.",
            AppError::BadRequest(_) => "Не удалось обработать запрос.",
            AppError::PayloadTooLarge(_) => "Загруженный файл слишком велик.",
            _ => "На сервере произошла ошибка. Попробуйте позже.",
        };

        HttpResponse::build(status)
            .content_type("text/html; charset=utf-8")
            .body(format!(
                "<!doctype html><html><head><title>{code} {title}</title></head>\
                 <body><h1>{code} {title}</h1><p>{detail}</p><a href=\"/\">На главную</a></body></html>",
                code = status.as_u16(),
                title = self.title(),
                detail = detail,
            ))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<tera::Error> for AppError {
    fn from(err: tera::Error) -> Self {
        // Tera nests the useful message in its source chain
        let mut message = err.to_string();
        let mut source = std::error::Error::source(&err);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        AppError::Template(message)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{:#}", err))
    }
}

impl From<actix_multipart::MultipartError> for AppError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<crypto_core::PasswordError> for AppError {
    fn from(err: crypto_core::PasswordError) -> Self {
        AppError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::not_found("post").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Database("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Forbidden("staff".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::LoginRequired { next: "/".into() }.status_code(),
            StatusCode::FOUND
        );
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_login_required_redirects_with_next() {
        let resp = AppError::LoginRequired {
            next: "/posts/create/".into(),
        }
        .error_response();

        assert_eq!(resp.status(), StatusCode::FOUND);
        let location = resp.headers().get(header::LOCATION).unwrap();
        assert_eq!(location, "/auth/login/?next=%2Fposts%2Fcreate%2F");
    }

    #[actix_web::test]
    async fn test_internal_detail_not_leaked() {
        let resp = AppError::Database("password authentication failed".into()).error_response();
        let body = to_bytes(resp.into_body()).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("500 Ошибка сервера"));
        assert!(!body.contains("password authentication failed"));
    }

    #[actix_web::test]
    async fn test_not_found_page_text() {
        let resp = AppError::not_found("post").error_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = to_bytes(resp.into_body()).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("404 Страница не найдена"));
        assert!(body.contains("На главную"));
    }
}
