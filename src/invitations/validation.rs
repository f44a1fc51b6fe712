/// Structural validation of invitation requests and responses
///
/// Every check runs independently and contributes at most one message, so a
/// caller sees all problems with a request at once.
use super::{InvitationAction, InvitationData, InvitationResponse};
use crate::teams::UserRole;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Longest invited email accepted (RFC 5321 path limit)
pub const MAX_INVITED_EMAIL_LENGTH: usize = 320;

/// Characters never allowed in identifiers and tokens
const DISALLOWED_CHARS: &[char] = &['<', '>', '"', '\'', '&'];

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid regex")
});

/// Result of a validation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationOutcome {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Conservative email shape check
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

pub fn contains_disallowed_characters(value: &str) -> bool {
    value.contains(DISALLOWED_CHARS)
}

/// Validate an invitation request
pub fn validate_invitation_data(data: &InvitationData) -> ValidationOutcome {
    let mut errors = Vec::new();

    let team_id = data.team_id.as_deref().unwrap_or("").trim();
    if team_id.is_empty() {
        errors.push("Team ID is required".to_string());
    } else if contains_disallowed_characters(team_id) {
        errors.push("Invalid characters in team ID".to_string());
    }

    let email = data.invited_email.as_deref().unwrap_or("").trim();
    if email.chars().count() > MAX_INVITED_EMAIL_LENGTH {
        errors.push("Email is too long".to_string());
    } else if !is_valid_email(email) {
        errors.push("Invalid email format".to_string());
    }

    let invited_by = data.invited_by.as_deref().unwrap_or("").trim();
    if invited_by.is_empty() {
        errors.push("Inviter ID is required".to_string());
    }

    let role_is_known = data
        .role
        .as_deref()
        .map(|role| role.parse::<UserRole>().is_ok())
        .unwrap_or(false);
    if !role_is_known {
        errors.push("Invalid role specified".to_string());
    }

    ValidationOutcome::from_errors(errors)
}

/// Validate an accept/decline request
pub fn validate_invitation_response(response: &InvitationResponse) -> ValidationOutcome {
    let mut errors = Vec::new();

    let token = response.token.as_deref().unwrap_or("").trim();
    if token.is_empty() {
        errors.push("Invitation token is required".to_string());
    } else if contains_disallowed_characters(token) {
        errors.push("Invalid characters in invitation token".to_string());
    }

    let action_is_known = response
        .action
        .as_deref()
        .map(|action| action.parse::<InvitationAction>().is_ok())
        .unwrap_or(false);
    if !action_is_known {
        errors.push("Invalid action. Must be 'accept' or 'decline'".to_string());
    }

    ValidationOutcome::from_errors(errors)
}
