//! Request/response payloads and persisted records.
//!
//! Every inbound DTO has a `validate()` that collects all field violations
//! instead of stopping at the first one. Payloads are shared between handlers
//! and `OpenAPI` generation.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

pub mod article;
pub mod comment;
pub mod user;

pub use article::{
    ArticleBody, ArticleListQuery, ArticleResponse, ArticleRow, ArticlesBody,
    NewArticle, NewArticleRequest, UpdateArticle, UpdateArticleRequest,
};
pub use comment::{
    Comment, CommentBody, CommentResponse, CommentRow, CommentsBody, NewComment,
    NewCommentRequest,
};
pub use user::{
    LoginRequest, LoginUser, NewUser, Profile, ProfileBody, RegisterRequest, UpdateUser,
    UpdateUserRequest, User, UserBody, UserResponse,
};

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 50;
pub const PASSWORD_MIN: usize = 6;
pub const PASSWORD_MAX: usize = 100;
/// bcrypt only reads this many bytes of input.
pub const PASSWORD_MAX_BYTES: usize = 72;
pub const BIO_MAX: usize = 500;
pub const TITLE_MAX: usize = 200;
pub const DESCRIPTION_MAX: usize = 500;
pub const BODY_MAX: usize = 10_000;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// All violations found in one payload, serialized as `{"errors": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shortcut for a payload with exactly one bad field.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Names of the rejected fields, in the order they were checked.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }

    /// # Errors
    /// Returns `self` when at least one violation was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&joined)
    }
}

impl std::error::Error for ValidationErrors {}

/// Case-insensitive email format check.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let email_normalized = email.to_lowercase();
    Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}$")
        .is_ok_and(|re| re.is_match(&email_normalized))
}

#[must_use]
pub fn is_valid_username(username: &str) -> bool {
    Regex::new(r"^[A-Za-z0-9_]+$").is_ok_and(|re| re.is_match(username))
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

pub(crate) fn check_username(errors: &mut ValidationErrors, username: &str) {
    let len = char_len(username);
    if username.is_empty() {
        errors.add("username", "username is required");
    } else if len < USERNAME_MIN {
        errors.add(
            "username",
            format!("username must be at least {USERNAME_MIN} characters long"),
        );
    } else if len > USERNAME_MAX {
        errors.add(
            "username",
            format!("username must be at most {USERNAME_MAX} characters long"),
        );
    } else if !is_valid_username(username) {
        errors.add(
            "username",
            "username can only contain letters, numbers, and underscores",
        );
    }
}

pub(crate) fn check_email(errors: &mut ValidationErrors, email: &str) {
    if email.is_empty() {
        errors.add("email", "email is required");
    } else if !is_valid_email(email) {
        errors.add("email", "email format is invalid");
    }
}

pub(crate) fn check_password(errors: &mut ValidationErrors, password: &str) {
    let len = char_len(password);
    if password.is_empty() {
        errors.add("password", "password is required");
    } else if len < PASSWORD_MIN {
        errors.add(
            "password",
            format!("password must be at least {PASSWORD_MIN} characters long"),
        );
    } else if len > PASSWORD_MAX {
        errors.add(
            "password",
            format!("password must be at most {PASSWORD_MAX} characters long"),
        );
    } else if password.len() > PASSWORD_MAX_BYTES {
        errors.add(
            "password",
            format!("password must be at most {PASSWORD_MAX_BYTES} bytes long"),
        );
    }
}

/// Required free text: present, not only whitespace, at most `max` characters.
pub(crate) fn check_text(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    if value.is_empty() {
        errors.add(field, format!("{field} is required"));
    } else if value.trim().is_empty() {
        errors.add(field, format!("{field} cannot be empty"));
    } else if char_len(value) > max {
        errors.add(field, format!("{field} must be at most {max} characters long"));
    }
}

pub(crate) fn check_max(errors: &mut ValidationErrors, field: &str, value: &str, max: usize) {
    if char_len(value) > max {
        errors.add(field, format!("{field} must be at most {max} characters long"));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn email_format() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("Alice.Smith+tag@Example.CO"));
        assert!(!is_valid_email("alice"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("alice@@example.com"));
        assert!(!is_valid_email("al ice@example.com"));
    }

    #[test]
    fn username_format() {
        assert!(is_valid_username("alice_01"));
        assert!(!is_valid_username("alice-01"));
        assert!(!is_valid_username("alice smith"));
        assert!(!is_valid_username(""));
    }

    #[test]
    fn password_is_capped_at_bcrypt_input_size() {
        let mut errors = ValidationErrors::new();
        check_password(&mut errors, &"a".repeat(PASSWORD_MAX_BYTES));
        assert!(errors.is_empty());

        check_password(&mut errors, &"a".repeat(PASSWORD_MAX_BYTES + 1));
        // 40 chars but 80 bytes.
        check_password(&mut errors, &"é".repeat(40));
        check_password(&mut errors, &"a".repeat(PASSWORD_MAX + 1));
        assert_eq!(errors.errors.len(), 3);
        assert_eq!(errors.errors[0].message, "password must be at most 72 bytes long");
        assert_eq!(errors.errors[1].message, "password must be at most 72 bytes long");
        assert_eq!(
            errors.errors[2].message,
            "password must be at most 100 characters long"
        );
    }

    #[test]
    fn check_text_messages() {
        let mut errors = ValidationErrors::new();
        check_text(&mut errors, "title", "", TITLE_MAX);
        check_text(&mut errors, "description", "   ", DESCRIPTION_MAX);
        check_text(&mut errors, "body", &"x".repeat(BODY_MAX + 1), BODY_MAX);
        check_text(&mut errors, "body", &"x".repeat(BODY_MAX), BODY_MAX);

        assert_eq!(errors.fields(), vec!["title", "description", "body"]);
        assert_eq!(errors.errors[0].message, "title is required");
        assert_eq!(errors.errors[1].message, "description cannot be empty");
    }

    #[test]
    fn lengths_count_characters() {
        let mut errors = ValidationErrors::new();
        check_max(&mut errors, "bio", &"é".repeat(BIO_MAX), BIO_MAX);
        assert!(errors.is_empty());
    }

    #[test]
    fn serializes_as_errors_array() {
        let errors = ValidationErrors::single("email", "email format is invalid");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"errors": [{"field": "email", "message": "email format is invalid"}]})
        );
        assert_eq!(errors.to_string(), "email: email format is invalid");
    }
}
