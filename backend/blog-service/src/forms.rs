/// HTML form input and validation
///
/// Field rules are declared with `validator`; cross-field and lookup rules
/// (password confirmation, category existence, username uniqueness) are
/// added by the callers into the same [`FormErrors`] so templates render
/// everything the same way.
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;
use validator::{Validate, ValidateEmail, ValidationError, ValidationErrors};

use crate::models::{PostView, User};

/// `<input type="datetime-local">` value
pub const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));
static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid slug regex"));

/// Field name -> messages, serialized straight into template contexts
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Result of handling a submitted form
#[derive(Debug)]
pub enum Submitted<T> {
    Saved(T),
    Invalid(FormErrors),
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FormErrors::default();
        for (field, field_errors) in errors.field_errors() {
            for err in field_errors.iter() {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| default_message(&err.code));
                out.add(&field.to_string(), message);
            }
        }
        out
    }
}

fn default_message(code: &str) -> String {
    match code {
        "length" => "Проверьте длину значения.".to_string(),
        "email" => "Введите правильный адрес электронной почты.".to_string(),
        _ => "Введите правильное значение.".to_string(),
    }
}

fn run_validation<T: Validate>(form: &T) -> FormErrors {
    match form.validate() {
        Ok(()) => FormErrors::default(),
        Err(errors) => errors.into(),
    }
}

fn validate_username(value: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("username").with_message(
            "Введите правильное имя пользователя. Оно может содержать только буквы, цифры и знаки @/./+/-/_."
                .into(),
        ))
    }
}

fn validate_optional_email(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() || value.validate_email() {
        Ok(())
    } else {
        Err(ValidationError::new("email").with_message("Введите правильный адрес электронной почты.".into()))
    }
}

fn validate_slug(value: &str) -> Result<(), ValidationError> {
    if SLUG_RE.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new("slug").with_message(
            "Используйте только латинские буквы, цифры, дефис и знак подчёркивания.".into(),
        ))
    }
}

fn validate_password_strength(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() < 8 {
        return Err(ValidationError::new("password_too_short")
            .with_message("Введённый пароль слишком короткий. Он должен содержать как минимум 8 символов.".into()));
    }
    if value.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("password_entirely_numeric")
            .with_message("Введённый пароль состоит только из цифр.".into()));
    }
    Ok(())
}

fn validate_datetime_local(value: &str) -> Result<(), ValidationError> {
    parse_datetime_local(value)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("datetime").with_message("Введите правильную дату и время.".into()))
}

/// Parse a `datetime-local` value as UTC; seconds are accepted
pub fn parse_datetime_local(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, DATETIME_LOCAL_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

pub fn format_datetime_local(value: DateTime<Utc>) -> String {
    value.format(DATETIME_LOCAL_FORMAT).to_string()
}

fn parse_optional_uuid(value: &str) -> Result<Option<Uuid>, ()> {
    let value = value.trim();
    if value.is_empty() {
        Ok(None)
    } else {
        Uuid::parse_str(value).map(Some).map_err(|_| ())
    }
}

fn field(fields: &HashMap<String, String>, name: &str) -> String {
    fields.get(name).cloned().unwrap_or_default()
}

// ---------------------------------------------------------------------
// Posts and comments
// ---------------------------------------------------------------------

/// Text fields of the post form, as submitted
#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct PostForm {
    #[validate(length(min = 1, max = 256, message = "Укажите заголовок не длиннее 256 символов."))]
    pub title: String,
    #[validate(length(min = 1, message = "Обязательное поле."))]
    pub text: String,
    #[validate(custom(function = "validate_datetime_local"))]
    pub pub_date: String,
    /// Location id or empty
    pub location: String,
    #[validate(length(min = 1, message = "Выберите категорию."))]
    pub category: String,
    /// "Clear" checkbox next to the current image
    pub image_clear: bool,
}

/// A post form that passed field validation
#[derive(Debug, Clone)]
pub struct CleanPostForm {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub location_id: Option<Uuid>,
    pub category_id: Uuid,
    pub image_clear: bool,
}

impl PostForm {
    /// Build from multipart text fields
    pub fn from_fields(fields: &HashMap<String, String>) -> Self {
        Self {
            title: field(fields, "title").trim().to_string(),
            text: field(fields, "text").trim().to_string(),
            pub_date: field(fields, "pub_date").trim().to_string(),
            location: field(fields, "location").trim().to_string(),
            category: field(fields, "category").trim().to_string(),
            image_clear: fields.contains_key("image-clear"),
        }
    }

    /// Blank form with `pub_date` preset to `now`
    pub fn blank(now: DateTime<Utc>) -> Self {
        Self {
            pub_date: format_datetime_local(now),
            ..Self::default()
        }
    }

    pub fn from_post(post: &PostView) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: format_datetime_local(post.pub_date),
            location: post.location_id.map(|id| id.to_string()).unwrap_or_default(),
            category: post.category_id.map(|id| id.to_string()).unwrap_or_default(),
            image_clear: false,
        }
    }

    pub fn clean(&self) -> Result<CleanPostForm, FormErrors> {
        let mut errors = run_validation(self);

        let location_id = match parse_optional_uuid(&self.location) {
            Ok(id) => id,
            Err(()) => {
                errors.add("location", "Выберите корректный вариант.");
                None
            }
        };
        let category_id = match parse_optional_uuid(&self.category) {
            Ok(id) => id,
            Err(()) => {
                errors.add("category", "Выберите корректный вариант.");
                None
            }
        };
        let pub_date = parse_datetime_local(&self.pub_date);

        match (errors.is_empty(), pub_date, category_id) {
            (true, Some(pub_date), Some(category_id)) => Ok(CleanPostForm {
                title: self.title.clone(),
                text: self.text.clone(),
                pub_date,
                location_id,
                category_id,
                image_clear: self.image_clear,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Обязательное поле."))]
    pub text: String,
}

impl CommentForm {
    pub fn clean(mut self) -> Result<String, (CommentForm, FormErrors)> {
        self.text = self.text.trim().to_string();
        let errors = run_validation(&self);
        if errors.is_empty() {
            Ok(self.text)
        } else {
            Err((self, errors))
        }
    }
}

// ---------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------

/// Profile edit form
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UserForm {
    #[serde(default)]
    #[validate(length(max = 150, message = "Убедитесь, что это значение содержит не более 150 символов."))]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(max = 150, message = "Убедитесь, что это значение содержит не более 150 символов."))]
    pub last_name: String,
    #[serde(default)]
    #[validate(
        length(min = 1, max = 150, message = "Обязательное поле. Не более 150 символов."),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub email: String,
}

impl UserForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }

    pub fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
        }
    }

    pub fn validate_fields(&self) -> FormErrors {
        run_validation(self)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn validate_fields(&self) -> FormErrors {
        let mut errors = FormErrors::default();
        if self.username.trim().is_empty() {
            errors.add("username", "Обязательное поле.");
        }
        if self.password.is_empty() {
            errors.add("password", "Обязательное поле.");
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegistrationForm {
    #[serde(default)]
    #[validate(
        length(min = 1, max = 150, message = "Обязательное поле. Не более 150 символов."),
        custom(function = "validate_username")
    )]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "validate_optional_email"))]
    pub email: String,
    #[serde(default, skip_serializing)]
    #[validate(custom(function = "validate_password_strength"))]
    pub password1: String,
    #[serde(default, skip_serializing)]
    pub password2: String,
}

impl RegistrationForm {
    pub fn validate_fields(&self) -> FormErrors {
        let mut errors = run_validation(self);
        if self.password1 != self.password2 {
            errors.add("password2", "Введённые пароли не совпадают.");
        }
        errors
    }
}

// ---------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CategoryForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 256, message = "Укажите заголовок не длиннее 256 символов."))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Обязательное поле."))]
    pub description: String,
    #[serde(default)]
    #[validate(
        length(min = 1, max = 64, message = "Укажите идентификатор не длиннее 64 символов."),
        custom(function = "validate_slug")
    )]
    pub slug: String,
    /// Checkbox: present when ticked
    #[serde(default)]
    pub is_published: Option<String>,
}

impl CategoryForm {
    pub fn validate_fields(&self) -> FormErrors {
        run_validation(self)
    }

    pub fn published(&self) -> bool {
        self.is_published.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LocationForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 256, message = "Укажите название не длиннее 256 символов."))]
    pub name: String,
    #[serde(default)]
    pub is_published: Option<String>,
}

impl LocationForm {
    pub fn validate_fields(&self) -> FormErrors {
        run_validation(self)
    }

    pub fn published(&self) -> bool {
        self.is_published.is_some()
    }
}

/// Publish/unpublish toggle posted from admin lists
#[derive(Debug, Clone, Deserialize)]
pub struct PublishToggle {
    pub is_published: bool,
}

/// Inline post edit on the admin post list
#[derive(Debug, Clone, Deserialize)]
pub struct PostFlagsForm {
    pub pub_date: String,
    #[serde(default)]
    pub is_published: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post_fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_post_form_clean() {
        let category = Uuid::new_v4();
        let form = PostForm::from_fields(&post_fields(&[
            ("title", "  Summit  "),
            ("text", "We made it."),
            ("pub_date", "2024-05-01T10:30"),
            ("location", ""),
            ("category", &category.to_string()),
        ]));

        let clean = form.clean().expect("valid form");
        assert_eq!(clean.title, "Summit");
        assert_eq!(clean.category_id, category);
        assert_eq!(clean.location_id, None);
        assert_eq!(format_datetime_local(clean.pub_date), "2024-05-01T10:30");
        assert!(!clean.image_clear);
    }

    #[test]
    fn test_post_form_reports_each_field() {
        let form = PostForm::from_fields(&post_fields(&[
            ("title", ""),
            ("text", ""),
            ("pub_date", "yesterday"),
            ("location", "nowhere"),
            ("category", ""),
        ]));

        let errors = form.clean().unwrap_err();
        for name in ["title", "text", "pub_date", "location", "category"] {
            assert!(errors.has(name), "missing error for {}", name);
        }
    }

    #[test]
    fn test_field_messages_are_russian() {
        let form = PostForm::from_fields(&post_fields(&[
            ("title", ""),
            ("text", ""),
            ("pub_date", "yesterday"),
            ("category", ""),
        ]));
        let json = serde_json::to_value(form.clean().unwrap_err()).unwrap();
        assert_eq!(json["text"][0], "Обязательное поле.");
        assert_eq!(json["pub_date"][0], "Введите правильную дату и время.");
        assert_eq!(json["category"][0], "Выберите категорию.");

        let registration = RegistrationForm {
            username: "anna".into(),
            email: String::new(),
            password1: "correct horse".into(),
            password2: "battery staple".into(),
        };
        let json = serde_json::to_value(registration.validate_fields()).unwrap();
        assert_eq!(json["password2"][0], "Введённые пароли не совпадают.");
    }

    #[test]
    fn test_post_title_limit_counts_chars() {
        let category = Uuid::new_v4().to_string();
        let mut fields = post_fields(&[
            ("text", "t"),
            ("pub_date", "2024-05-01T10:30"),
            ("category", &category),
        ]);
        fields.insert("title".into(), "я".repeat(256));
        assert!(PostForm::from_fields(&fields).clean().is_ok());

        fields.insert("title".into(), "я".repeat(257));
        assert!(PostForm::from_fields(&fields).clean().unwrap_err().has("title"));
    }

    #[test]
    fn test_image_clear_checkbox() {
        let form = PostForm::from_fields(&post_fields(&[("image-clear", "on")]));
        assert!(form.image_clear);
    }

    #[test]
    fn test_datetime_local_accepts_seconds() {
        assert!(parse_datetime_local("2024-05-01T10:30:15").is_some());
        assert!(parse_datetime_local("2024-05-01 10:30").is_none());
    }

    #[test]
    fn test_comment_form_trims_and_requires_text() {
        let ok = CommentForm { text: "  nice  ".into() }.clean();
        assert_eq!(ok.unwrap(), "nice");

        let (form, errors) = CommentForm { text: "   ".into() }.clean().unwrap_err();
        assert_eq!(form.text, "");
        assert!(errors.has("text"));
    }

    #[test]
    fn test_user_form_username_rules() {
        let mut form = UserForm {
            username: "leo.t+blog@home".into(),
            ..UserForm::default()
        };
        assert!(form.validate_fields().is_empty());

        form.username = "leo tolstoy".into();
        assert!(form.validate_fields().has("username"));

        form.username = "x".repeat(151);
        assert!(form.validate_fields().has("username"));
    }

    #[test]
    fn test_user_form_email_optional_but_checked() {
        let mut form = UserForm {
            username: "leo".into(),
            ..UserForm::default()
        };
        assert!(form.validate_fields().is_empty());

        form.email = "not-an-email".into();
        assert!(form.validate_fields().has("email"));

        form.email = "leo@example.com".into();
        assert!(form.validate_fields().is_empty());
    }

    #[test]
    fn test_registration_password_rules() {
        let mut form = RegistrationForm {
            username: "anna".into(),
            email: String::new(),
            password1: "short".into(),
            password2: "short".into(),
        };
        assert!(form.validate_fields().has("password1"));

        form.password1 = "1234567890".into();
        form.password2 = "1234567890".into();
        assert!(form.validate_fields().has("password1"));

        form.password1 = "correct horse".into();
        form.password2 = "battery staple".into();
        let errors = form.validate_fields();
        assert!(!errors.has("password1"));
        assert!(errors.has("password2"));

        form.password2 = "correct horse".into();
        assert!(form.validate_fields().is_empty());
    }

    #[test]
    fn test_category_slug_rules() {
        let mut form = CategoryForm {
            title: "Travel".into(),
            description: "Trips".into(),
            slug: "travel_2024-summer".into(),
            is_published: Some("on".into()),
        };
        assert!(form.validate_fields().is_empty());
        assert!(form.published());

        form.slug = "путешествия".into();
        assert!(form.validate_fields().has("slug"));
    }

    #[test]
    fn test_errors_serialize_as_map() {
        let mut errors = FormErrors::default();
        errors.add("text", "Обязательное поле.");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["text"][0], "Обязательное поле.");
    }
}
