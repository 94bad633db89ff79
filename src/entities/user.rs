use super::{BIO_MAX, ValidationErrors, check_email, check_max, check_password, check_username};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Stored account. The password hash never leaves the server.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub bio: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn to_response(&self, token: String) -> UserResponse {
        UserResponse {
            email: self.email.clone(),
            token,
            username: self.username.clone(),
            bio: self.bio.clone(),
            image: self.image.clone(),
        }
    }

    #[must_use]
    pub fn to_profile(&self) -> Profile {
        Profile {
            username: self.username.clone(),
            bio: self.bio.clone(),
            image: self.image.clone(),
            following: false,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct NewUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl NewUser {
    /// # Errors
    /// Returns every username, email and password violation at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_username(&mut errors, &self.username);
        check_email(&mut errors, &self.email);
        check_password(&mut errors, &self.password);
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginUser {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginUser {
    /// # Errors
    /// Returns the email format and missing password violations.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_email(&mut errors, &self.email);
        if self.password.is_empty() {
            errors.add("password", "password is required");
        }
        errors.into_result()
    }
}

/// Partial profile update; `None` leaves the stored value untouched.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
}

impl UpdateUser {
    /// # Errors
    /// Returns every violation among the fields that are present.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(username) = &self.username {
            check_username(&mut errors, username);
        }
        if let Some(email) = &self.email {
            check_email(&mut errors, email);
        }
        if let Some(password) = &self.password {
            check_password(&mut errors, password);
        }
        if let Some(bio) = &self.bio {
            check_max(&mut errors, "bio", bio, BIO_MAX);
        }
        errors.into_result()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.bio.is_none()
            && self.image.is_none()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub user: NewUser,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub user: LoginUser,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub user: UpdateUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub email: String,
    pub token: String,
    pub username: String,
    pub bio: String,
    pub image: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserBody {
    pub user: UserResponse,
}

/// Public view of a user. Following is not supported, so `following` is always false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub username: String,
    pub bio: String,
    pub image: String,
    pub following: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileBody {
    pub profile: Profile,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str, password: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn new_user_valid() {
        assert!(new_user("alice", "alice@example.com", "secret1").validate().is_ok());
    }

    #[test]
    fn new_user_reports_every_bad_field() {
        let errors = new_user("al", "not-an-email", "secret1")
            .validate()
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["username", "email"]);
        assert_eq!(
            errors.errors[0].message,
            "username must be at least 3 characters long"
        );
        assert_eq!(errors.errors[1].message, "email format is invalid");
    }

    #[test]
    fn new_user_missing_fields() {
        let errors = NewUser::default().validate().unwrap_err();
        assert_eq!(errors.fields(), vec!["username", "email", "password"]);
        assert!(errors.errors.iter().all(|e| e.message.ends_with("is required")));
    }

    #[test]
    fn new_user_limits() {
        let errors = new_user(&"a".repeat(51), "a@b.io", "12345")
            .validate()
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["username", "password"]);

        let errors = new_user("bad-name", "a@b.io", &"p".repeat(101))
            .validate()
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["username", "password"]);
    }

    #[test]
    fn login_requires_email_and_password() {
        let login = LoginUser {
            email: "alice@example".to_string(),
            password: String::new(),
        };
        let errors = login.validate().unwrap_err();
        assert_eq!(errors.fields(), vec!["email", "password"]);
    }

    #[test]
    fn update_only_checks_present_fields() {
        assert!(UpdateUser::default().validate().is_ok());
        assert!(UpdateUser::default().is_empty());

        let update = UpdateUser {
            bio: Some(String::new()),
            image: Some(String::new()),
            ..UpdateUser::default()
        };
        assert!(update.validate().is_ok());

        let update = UpdateUser {
            username: Some(String::new()),
            email: Some("nope".to_string()),
            password: Some("123".to_string()),
            bio: Some("b".repeat(501)),
            image: None,
        };
        let errors = update.validate().unwrap_err();
        assert_eq!(errors.fields(), vec!["username", "email", "password", "bio"]);
    }

    #[test]
    fn register_request_deserializes_missing_fields_as_empty() {
        let request: RegisterRequest =
            serde_json::from_str(r#"{"user":{"email":"alice@example.com"}}"#).unwrap();
        assert_eq!(request.user.email, "alice@example.com");
        assert!(request.user.username.is_empty());
    }
}
