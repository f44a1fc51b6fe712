/// Account management system
///
/// Handles user registration, password authentication, sessions, and
/// profile updates.

mod manager;
pub mod password;

pub use manager::AccountManager;

use crate::{db::models::User, teams::UserRole};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// Registration request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "First name must be between 1 and 50 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "Last name must be between 1 and 50 characters"))]
    pub last_name: String,
}

/// Login request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
        }
    }
}

/// Login / registration response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserSummary,
}

/// Session status (for GET /api/users/session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummary>,
}

/// Session resolved from a presented token
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub session_id: String,
    pub user_id: String,
}

/// A freshly created session; `token` is only ever handed to the client
#[derive(Debug, Clone)]
pub struct NewSession {
    pub token: String,
    pub session: crate::db::models::Session,
}

/// Flatten `validator` errors into one message, sorted by field
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                err.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", field))
            })
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let request = RegisterRequest {
            email: "someone@example.com".to_string(),
            password: "long enough".to_string(),
            first_name: "Some".to_string(),
            last_name: "One".to_string(),
        };
        assert!(request.validate().is_ok());

        let bad = RegisterRequest {
            email: "nope".to_string(),
            password: "short".to_string(),
            ..request
        };
        let errors = bad.validate().unwrap_err();
        assert_eq!(
            validation_message(&errors),
            "Please enter a valid email address; Password must be between 8 and 128 characters"
        );
    }

    #[test]
    fn test_login_request_requires_fields() {
        let errors = LoginRequest::default().validate().unwrap_err();
        assert_eq!(
            validation_message(&errors),
            "Email is required; Password is required"
        );
    }

    #[test]
    fn test_session_status_omits_missing_user() {
        let json = serde_json::to_value(SessionStatus { valid: false, user: None }).unwrap();
        assert_eq!(json, serde_json::json!({"valid": false}));
    }
}
