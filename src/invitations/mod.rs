/// Team invitation system
///
/// Covers the whole invitation lifecycle: sanitizing and validating inbound
/// requests, issuing tokens, computing expiry, persisting records, and
/// formatting them for API responses.

pub mod lifecycle;
pub mod manager;
pub mod sanitize;
pub mod token;
pub mod validation;

pub use lifecycle::{
    can_user_invite_to_team, format_invitation_for_response, invitation_expiry_date,
    is_invitation_expired, FormattedInvitation,
};
pub use manager::{InvitationManager, NewInvitation};
pub use sanitize::{sanitize_input, sanitize_invitation_data};
pub use token::create_invitation_token;
pub use validation::{validate_invitation_data, validate_invitation_response, ValidationOutcome};

use crate::{
    error::{AppError, AppResult},
    teams::UserRole,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use std::{fmt, str::FromStr};

/// Default number of days an invitation stays valid
pub const DEFAULT_INVITATION_EXPIRY_DAYS: i64 = 7;

/// Read a client-supplied text field; any non-string JSON value counts as
/// absent so the validator reports it instead of deserialization failing
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => Some(value),
        _ => None,
    })
}

/// Invitation request as submitted by a client
///
/// Every field is optional so that missing, `null` and wrongly typed values
/// reach the validator instead of failing deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub team_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub invited_email: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub invited_by: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub role: Option<String>,
}

/// Accept/decline request correlated to a stored invitation by token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvitationResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub action: Option<String>,
}

/// Invitation status; only moves forward from `Pending`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Declined,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Accepted => "accepted",
            InvitationStatus::Declined => "declined",
        }
    }

    pub fn can_transition_to(&self, next: InvitationStatus) -> bool {
        matches!(
            (self, next),
            (InvitationStatus::Pending, InvitationStatus::Accepted)
                | (InvitationStatus::Pending, InvitationStatus::Declined)
        )
    }

    /// Move to `next`, rejecting anything but pending → accepted/declined
    pub fn transition_to(self, next: InvitationStatus) -> AppResult<InvitationStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(AppError::Conflict(format!(
                "Invitation has already been {}",
                self.as_str()
            )))
        }
    }
}

impl FromStr for InvitationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            "declined" => Ok(InvitationStatus::Declined),
            _ => Err(AppError::Internal(format!("Unknown invitation status: {}", s))),
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer given by the invitee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationAction {
    Accept,
    Decline,
}

impl InvitationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationAction::Accept => "accept",
            InvitationAction::Decline => "decline",
        }
    }

    /// Status the invitation ends up in after this action
    pub fn resulting_status(&self) -> InvitationStatus {
        match self {
            InvitationAction::Accept => InvitationStatus::Accepted,
            InvitationAction::Decline => InvitationStatus::Declined,
        }
    }
}

impl FromStr for InvitationAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(InvitationAction::Accept),
            "decline" => Ok(InvitationAction::Decline),
            _ => Err(AppError::Validation(
                "Invalid action. Must be 'accept' or 'decline'".to_string(),
            )),
        }
    }
}

/// Persisted invitation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationRecord {
    pub id: String,
    pub team_id: String,
    pub invited_email: String,
    pub invited_by: String,
    pub role: UserRole,
    pub status: InvitationStatus,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InvitationRecord {
    pub fn from_row(row: &SqliteRow) -> AppResult<Self> {
        let role: String = row.try_get("role")?;
        let status: String = row.try_get("status")?;
        Ok(Self {
            id: row.try_get("id")?,
            team_id: row.try_get("team_id")?,
            invited_email: row.try_get("invited_email")?,
            invited_by: row.try_get("invited_by")?,
            role: role.parse()?,
            status: status.parse()?,
            token: row.try_get("token")?,
            expires_at: row.try_get("expires_at")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    pub fn is_expired(&self) -> bool {
        is_invitation_expired(self.expires_at)
    }
}
