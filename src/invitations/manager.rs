/// Invitation persistence and the accept/decline workflow
use super::{
    can_user_invite_to_team, create_invitation_token, format_invitation_for_response,
    lifecycle::expiry_date_from, FormattedInvitation, InvitationAction, InvitationRecord,
    InvitationStatus,
};
use crate::{
    db::models::User,
    error::{AppError, AppResult},
    teams::UserRole,
};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

/// Invitation columns plus the names used for formatting
const FORMATTED_SELECT: &str = "SELECT i.id, i.team_id, i.invited_email, i.invited_by, i.role, i.status,
            i.token, i.expires_at, i.created_at, i.updated_at,
            t.name AS team_name, u.first_name AS inviter_first_name, u.last_name AS inviter_last_name
     FROM invitations i
     LEFT JOIN teams t ON t.id = i.team_id
     LEFT JOIN users u ON u.id = i.invited_by";

/// Validated invitation ready to be stored
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub team_id: String,
    pub invited_email: String,
    pub invited_by: String,
    pub role: UserRole,
}

pub struct InvitationManager {
    db: SqlitePool,
    expiry_days: i64,
}

impl InvitationManager {
    pub fn new(db: SqlitePool, expiry_days: i64) -> Self {
        Self { db, expiry_days }
    }

    /// Store a new invitation after checking the inviter's rights
    pub async fn create_invitation(&self, invitation: NewInvitation) -> AppResult<InvitationRecord> {
        let team_exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams WHERE id = ?1")
            .bind(&invitation.team_id)
            .fetch_one(&self.db)
            .await?;
        if team_exists == 0 {
            return Err(AppError::NotFound("Team not found".to_string()));
        }

        let inviter_role: Option<String> = sqlx::query_scalar(
            "SELECT role FROM team_members WHERE team_id = ?1 AND user_id = ?2",
        )
        .bind(&invitation.team_id)
        .bind(&invitation.invited_by)
        .fetch_optional(&self.db)
        .await?;
        let may_invite = match inviter_role {
            Some(role) => can_user_invite_to_team(role.parse()?),
            None => false,
        };
        if !may_invite {
            return Err(AppError::Authorization(
                "Only team leads can invite members to this team".to_string(),
            ));
        }

        let email = invitation.invited_email.trim().to_lowercase();

        // Checks and insert share one transaction; the partial unique index on
        // pending invitations catches whatever still races past the checks
        let mut tx = self.db.begin().await?;

        let already_member: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM team_members m JOIN users u ON u.id = m.user_id
             WHERE m.team_id = ?1 AND u.email = ?2",
        )
        .bind(&invitation.team_id)
        .bind(&email)
        .fetch_one(&mut *tx)
        .await?;
        if already_member > 0 {
            return Err(AppError::Conflict(
                "User is already a member of this team".to_string(),
            ));
        }

        let now = Utc::now();
        let open_invitations: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM invitations
             WHERE team_id = ?1 AND invited_email = ?2 AND status = 'pending' AND expires_at > ?3",
        )
        .bind(&invitation.team_id)
        .bind(&email)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        if open_invitations > 0 {
            return Err(duplicate_pending());
        }

        // An expired pending invitation is superseded by the new one
        sqlx::query(
            "DELETE FROM invitations
             WHERE team_id = ?1 AND invited_email = ?2 AND status = 'pending' AND expires_at <= ?3",
        )
        .bind(&invitation.team_id)
        .bind(&email)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let record = InvitationRecord {
            id: Uuid::new_v4().to_string(),
            team_id: invitation.team_id,
            invited_email: email,
            invited_by: invitation.invited_by,
            role: invitation.role,
            status: InvitationStatus::Pending,
            token: create_invitation_token(),
            expires_at: expiry_date_from(now, self.expiry_days),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO invitations (id, team_id, invited_email, invited_by, role, status, token, expires_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&record.id)
        .bind(&record.team_id)
        .bind(&record.invited_email)
        .bind(&record.invited_by)
        .bind(record.role.as_str())
        .bind(record.status.as_str())
        .bind(&record.token)
        .bind(record.expires_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => duplicate_pending(),
            e => AppError::Database(e),
        })?;

        tx.commit().await?;

        tracing::info!(
            invitation_id = %record.id,
            team_id = %record.team_id,
            role = %record.role,
            "Created invitation"
        );

        Ok(record)
    }

    pub async fn get_by_token(&self, token: &str) -> AppResult<InvitationRecord> {
        let row = sqlx::query(
            "SELECT id, team_id, invited_email, invited_by, role, status, token, expires_at, created_at, updated_at
             FROM invitations WHERE token = ?1",
        )
        .bind(token)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Invitation not found".to_string()))?;

        InvitationRecord::from_row(&row)
    }

    /// API shape of a stored invitation, with team and inviter names resolved
    pub async fn format(&self, record: &InvitationRecord) -> AppResult<FormattedInvitation> {
        let row = sqlx::query(&format!("{} WHERE i.id = ?1", FORMATTED_SELECT))
            .bind(&record.id)
            .fetch_optional(&self.db)
            .await?;

        match row {
            Some(row) => formatted_from_row(&row),
            None => Ok(format_invitation_for_response(record, None, None)),
        }
    }

    /// Every invitation of a team, newest first
    pub async fn list_for_team(&self, team_id: &str) -> AppResult<Vec<FormattedInvitation>> {
        let rows = sqlx::query(&format!(
            "{} WHERE i.team_id = ?1 ORDER BY i.created_at DESC",
            FORMATTED_SELECT
        ))
        .bind(team_id)
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(formatted_from_row).collect()
    }

    /// Pending, unexpired invitations addressed to an email
    pub async fn list_pending_for_email(&self, email: &str) -> AppResult<Vec<FormattedInvitation>> {
        let rows = sqlx::query(&format!(
            "{} WHERE i.invited_email = ?1 AND i.status = 'pending' AND i.expires_at > ?2
             ORDER BY i.created_at DESC",
            FORMATTED_SELECT
        ))
        .bind(email.trim().to_lowercase())
        .bind(Utc::now())
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(formatted_from_row).collect()
    }

    /// Accept or decline an invitation on behalf of `responder`
    ///
    /// Accepting adds the responder to the team with the invited role.
    pub async fn respond(
        &self,
        token: &str,
        action: InvitationAction,
        responder: &User,
    ) -> AppResult<InvitationRecord> {
        let mut record = self.get_by_token(token).await?;

        if !record.invited_email.eq_ignore_ascii_case(&responder.email) {
            return Err(AppError::Authorization(
                "This invitation was sent to a different email address".to_string(),
            ));
        }

        let next = record.status.transition_to(action.resulting_status())?;

        if record.is_expired() {
            return Err(AppError::Gone("Invitation has expired".to_string()));
        }

        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        // Guarded on status so concurrent responses cannot both succeed
        let updated = sqlx::query(
            "UPDATE invitations SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = 'pending'",
        )
        .bind(next.as_str())
        .bind(now)
        .bind(&record.id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::Conflict(
                "Invitation has already been answered".to_string(),
            ));
        }

        if action == InvitationAction::Accept {
            sqlx::query(
                "INSERT INTO team_members (team_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (team_id, user_id) DO NOTHING",
            )
            .bind(&record.team_id)
            .bind(&responder.id)
            .bind(record.role.as_str())
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            invitation_id = %record.id,
            user_id = %responder.id,
            status = %next,
            "Invitation answered"
        );

        record.status = next;
        record.updated_at = now;
        Ok(record)
    }
}

fn duplicate_pending() -> AppError {
    AppError::Conflict("A pending invitation already exists for this email".to_string())
}

fn formatted_from_row(row: &SqliteRow) -> AppResult<FormattedInvitation> {
    let record = InvitationRecord::from_row(row)?;
    let team_name: Option<String> = row.try_get("team_name")?;
    let first: Option<String> = row.try_get("inviter_first_name")?;
    let last: Option<String> = row.try_get("inviter_last_name")?;

    let inviter_name = match (first, last) {
        (None, None) => None,
        (first, last) => Some(
            format!("{} {}", first.unwrap_or_default(), last.unwrap_or_default())
                .trim()
                .to_string(),
        ),
    };

    Ok(format_invitation_for_response(
        &record,
        team_name.as_deref(),
        inviter_name.as_deref(),
    ))
}
