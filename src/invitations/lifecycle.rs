/// Invitation expiry, permission, and response formatting helpers
use super::InvitationRecord;
use crate::teams::UserRole;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_TEAM: &str = "Unknown Team";
pub const UNKNOWN_USER: &str = "Unknown User";

/// Invitation shape returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedInvitation {
    pub id: String,
    pub team_id: String,
    pub team_name: String,
    pub invited_email: String,
    pub invited_by: String,
    pub inviter_name: String,
    pub role: UserRole,
    pub status: super::InvitationStatus,
    pub expires_at: String,
    pub created_at: String,
    pub updated_at: String,
    pub message: String,
}

/// Expiry timestamp `days` days from now
pub fn invitation_expiry_date(days: i64) -> DateTime<Utc> {
    expiry_date_from(Utc::now(), days)
}

pub fn expiry_date_from(start: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    start + Duration::days(days)
}

/// An invitation whose expiry is not in the future is expired
pub fn is_invitation_expired(expires_at: DateTime<Utc>) -> bool {
    is_expired_at(expires_at, Utc::now())
}

pub fn is_expired_at(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at <= now
}

pub fn can_user_invite_to_team(role: UserRole) -> bool {
    role.can_invite()
}

fn iso8601(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Map a stored invitation to its API representation
pub fn format_invitation_for_response(
    record: &InvitationRecord,
    team_name: Option<&str>,
    inviter_name: Option<&str>,
) -> FormattedInvitation {
    let team_name = team_name.unwrap_or(UNKNOWN_TEAM).to_string();
    let inviter_name = inviter_name.unwrap_or(UNKNOWN_USER).to_string();
    let message = format!(
        "You have been invited to join {} as a {} by {}",
        team_name, record.role, inviter_name
    );

    FormattedInvitation {
        id: record.id.clone(),
        team_id: record.team_id.clone(),
        team_name,
        invited_email: record.invited_email.clone(),
        invited_by: record.invited_by.clone(),
        inviter_name,
        role: record.role,
        status: record.status,
        expires_at: iso8601(record.expires_at),
        created_at: iso8601(record.created_at),
        updated_at: iso8601(record.updated_at),
        message,
    }
}
