/// Profile form validation
///
/// Produces field-keyed error messages and, when the form is acceptable, a
/// sanitized copy ready to be stored.
use crate::invitations::{lenient_string, sanitize_input, validation::is_valid_email};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_EMAIL_LENGTH: usize = 255;

/// Profile edit form as submitted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileFormData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub email: Option<String>,
}

/// Cleaned profile values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizedProfile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileValidation {
    pub is_valid: bool,
    pub errors: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitized_data: Option<SanitizedProfile>,
}

fn check_name(
    errors: &mut BTreeMap<String, String>,
    field: &str,
    label: &str,
    value: &str,
) {
    if value.is_empty() {
        errors.insert(field.to_string(), format!("{} is required", label));
    } else if value.chars().count() > MAX_NAME_LENGTH {
        errors.insert(
            field.to_string(),
            format!("{} must be {} characters or less", label, MAX_NAME_LENGTH),
        );
    }
}

/// Validate and sanitize a profile form
pub fn validate_profile_form_data(form: &ProfileFormData) -> ProfileValidation {
    let mut errors = BTreeMap::new();

    let first_name = sanitize_input(form.first_name.as_deref().unwrap_or(""));
    let last_name = sanitize_input(form.last_name.as_deref().unwrap_or(""));
    check_name(&mut errors, "first_name", "First name", &first_name);
    check_name(&mut errors, "last_name", "Last name", &last_name);

    let email = form.email.as_deref().unwrap_or("").trim();
    if email.is_empty() {
        errors.insert("email".to_string(), "Email is required".to_string());
    } else if email.chars().count() > MAX_EMAIL_LENGTH {
        errors.insert(
            "email".to_string(),
            format!("Email must be {} characters or less", MAX_EMAIL_LENGTH),
        );
    } else if !is_valid_email(email) {
        errors.insert(
            "email".to_string(),
            "Please enter a valid email address".to_string(),
        );
    }

    let is_valid = errors.is_empty();
    let sanitized_data = is_valid.then(|| SanitizedProfile {
        first_name,
        last_name,
        email: sanitize_input(email),
    });

    ProfileValidation {
        is_valid,
        errors,
        sanitized_data,
    }
}
