/// Calendar entry storage and access rules
///
/// An entry is visible to its creator and, when attached to a team, to every
/// member of that team. Only the creator or a team lead of the entry's team
/// may change or delete it.
use super::{validate_calendar_entry, CalendarEntry, CalendarEntryRequest};
use crate::{
    error::{AppError, AppResult},
    teams::UserRole,
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

const ENTRY_COLUMNS: &str =
    "id, team_id, created_by, title, description, start_date, end_date, created_at, updated_at";

pub struct CalendarManager {
    db: SqlitePool,
}

impl CalendarManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Entries visible to a user, ordered by start date
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<CalendarEntry>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM calendar_entries
             WHERE created_by = ?1
                OR team_id IN (SELECT team_id FROM team_members WHERE user_id = ?1)
             ORDER BY start_date ASC",
            ENTRY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(CalendarEntry::from_row).collect()
    }

    pub async fn get_entry(&self, entry_id: &str, user_id: &str) -> AppResult<CalendarEntry> {
        let entry = self.find(entry_id).await?;
        if !self.can_view(&entry, user_id).await? {
            return Err(not_found());
        }
        Ok(entry)
    }

    pub async fn create_entry(
        &self,
        user_id: &str,
        request: &CalendarEntryRequest,
    ) -> AppResult<CalendarEntry> {
        let valid = validate_calendar_entry(request)?;
        if let Some(team_id) = valid.team_id.as_deref() {
            self.require_membership(team_id, user_id).await?;
        }

        let now = Utc::now();
        let entry = CalendarEntry {
            id: Uuid::new_v4().to_string(),
            team_id: valid.team_id,
            created_by: user_id.to_string(),
            title: valid.title,
            description: valid.description,
            start_date: valid.start_date,
            end_date: valid.end_date,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO calendar_entries (id, team_id, created_by, title, description, start_date, end_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&entry.id)
        .bind(&entry.team_id)
        .bind(&entry.created_by)
        .bind(&entry.title)
        .bind(&entry.description)
        .bind(entry.start_date)
        .bind(entry.end_date)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .execute(&self.db)
        .await?;

        Ok(entry)
    }

    /// Replace an entry's fields
    pub async fn update_entry(
        &self,
        entry_id: &str,
        user_id: &str,
        request: &CalendarEntryRequest,
    ) -> AppResult<CalendarEntry> {
        let existing = self.find(entry_id).await?;
        self.require_modify(&existing, user_id).await?;

        let valid = validate_calendar_entry(request)?;
        if let Some(team_id) = valid.team_id.as_deref() {
            if existing.team_id.as_deref() != Some(team_id) {
                self.require_membership(team_id, user_id).await?;
            }
        }

        let updated = CalendarEntry {
            team_id: valid.team_id,
            title: valid.title,
            description: valid.description,
            start_date: valid.start_date,
            end_date: valid.end_date,
            updated_at: Utc::now(),
            ..existing
        };

        sqlx::query(
            "UPDATE calendar_entries
             SET team_id = ?1, title = ?2, description = ?3, start_date = ?4, end_date = ?5, updated_at = ?6
             WHERE id = ?7",
        )
        .bind(&updated.team_id)
        .bind(&updated.title)
        .bind(&updated.description)
        .bind(updated.start_date)
        .bind(updated.end_date)
        .bind(updated.updated_at)
        .bind(&updated.id)
        .execute(&self.db)
        .await?;

        Ok(updated)
    }

    pub async fn delete_entry(&self, entry_id: &str, user_id: &str) -> AppResult<()> {
        let existing = self.find(entry_id).await?;
        self.require_modify(&existing, user_id).await?;

        sqlx::query("DELETE FROM calendar_entries WHERE id = ?1")
            .bind(&existing.id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    async fn find(&self, entry_id: &str) -> AppResult<CalendarEntry> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM calendar_entries WHERE id = ?1",
            ENTRY_COLUMNS
        ))
        .bind(entry_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(not_found)?;

        CalendarEntry::from_row(&row)
    }

    async fn member_role(&self, team_id: &str, user_id: &str) -> AppResult<Option<UserRole>> {
        let role: Option<String> = sqlx::query_scalar(
            "SELECT role FROM team_members WHERE team_id = ?1 AND user_id = ?2",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        role.map(|r| r.parse()).transpose()
    }

    async fn can_view(&self, entry: &CalendarEntry, user_id: &str) -> AppResult<bool> {
        if entry.created_by == user_id {
            return Ok(true);
        }
        match entry.team_id.as_deref() {
            Some(team_id) => Ok(self.member_role(team_id, user_id).await?.is_some()),
            None => Ok(false),
        }
    }

    async fn require_modify(&self, entry: &CalendarEntry, user_id: &str) -> AppResult<()> {
        if entry.created_by == user_id {
            return Ok(());
        }
        let role = match entry.team_id.as_deref() {
            Some(team_id) => self.member_role(team_id, user_id).await?,
            None => None,
        };
        match role {
            Some(UserRole::TeamLead) => Ok(()),
            Some(_) => Err(AppError::Authorization(
                "You do not have permission to modify this calendar entry".to_string(),
            )),
            // Entries the caller cannot even see are reported as missing
            None => Err(not_found()),
        }
    }

    async fn require_membership(&self, team_id: &str, user_id: &str) -> AppResult<()> {
        match self.member_role(team_id, user_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::Authorization(
                "You are not a member of this team".to_string(),
            )),
        }
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Calendar entry not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        account::{AccountManager, RegisterRequest},
        config::ServerConfig,
        db::create_memory_pool,
        invitations::{InvitationAction, InvitationManager, NewInvitation},
        teams::{CreateTeamRequest, TeamManager},
    };
    use std::sync::Arc;

    struct Fixture {
        accounts: AccountManager,
        teams: TeamManager,
        invitations: InvitationManager,
        calendar: CalendarManager,
    }

    async fn fixture() -> Fixture {
        let pool = create_memory_pool().await.unwrap();
        Fixture {
            accounts: AccountManager::new(pool.clone(), Arc::new(ServerConfig::default())),
            teams: TeamManager::new(pool.clone()),
            invitations: InvitationManager::new(pool.clone(), 7),
            calendar: CalendarManager::new(pool),
        }
    }

    async fn register(f: &Fixture, email: &str) -> crate::db::models::User {
        f.accounts
            .register(RegisterRequest {
                email: email.to_string(),
                password: "password123".to_string(),
                first_name: "Cal".to_string(),
                last_name: "Endar".to_string(),
            })
            .await
            .unwrap()
    }

    fn entry(title: &str, team_id: Option<&str>) -> CalendarEntryRequest {
        CalendarEntryRequest {
            title: Some(title.to_string()),
            description: None,
            start_date: Some("2024-06-01".to_string()),
            end_date: Some("2024-06-02T17:00:00Z".to_string()),
            team_id: team_id.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_personal_entry_crud() {
        let f = fixture().await;
        let owner = register(&f, "owner@example.com").await;
        let other = register(&f, "other@example.com").await;

        let created = f.calendar.create_entry(&owner.id, &entry("Dentist", None)).await.unwrap();
        let fetched = f.calendar.get_entry(&created.id, &owner.id).await.unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.title, "Dentist");
        assert_eq!(fetched.start_date, created.start_date);
        assert!(matches!(
            f.calendar.get_entry(&created.id, &other.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(f.calendar.list_for_user(&other.id).await.unwrap().is_empty());

        let updated = f
            .calendar
            .update_entry(&created.id, &owner.id, &entry("Dentist (moved)", None))
            .await
            .unwrap();
        assert_eq!(updated.title, "Dentist moved");
        assert_eq!(updated.created_by, owner.id);

        f.calendar.delete_entry(&created.id, &owner.id).await.unwrap();
        assert!(matches!(
            f.calendar.get_entry(&created.id, &owner.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            f.calendar.delete_entry(&created.id, &owner.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_team_entries() {
        let f = fixture().await;
        let lead = register(&f, "lead@example.com").await;
        let member = register(&f, "member@example.com").await;
        let outsider = register(&f, "outsider@example.com").await;

        let team = f
            .teams
            .create_team(
                &lead.id,
                &CreateTeamRequest {
                    name: Some("Ops".to_string()),
                    description: None,
                },
            )
            .await
            .unwrap();
        let invitation = f
            .invitations
            .create_invitation(NewInvitation {
                team_id: team.id.clone(),
                invited_email: member.email.clone(),
                invited_by: lead.id.clone(),
                role: UserRole::TeamMember,
            })
            .await
            .unwrap();
        f.invitations
            .respond(&invitation.token, InvitationAction::Accept, &member)
            .await
            .unwrap();

        let err = f
            .calendar
            .create_entry(&outsider.id, &entry("Crash", Some(&team.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        let by_member = f
            .calendar
            .create_entry(&member.id, &entry("Standup", Some(&team.id)))
            .await
            .unwrap();
        let by_lead = f
            .calendar
            .create_entry(&lead.id, &entry("Planning", Some(&team.id)))
            .await
            .unwrap();

        assert_eq!(f.calendar.list_for_user(&member.id).await.unwrap().len(), 2);

        let err = f
            .calendar
            .update_entry(&by_lead.id, &member.id, &entry("Hijack", Some(&team.id)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));

        f.calendar.delete_entry(&by_member.id, &lead.id).await.unwrap();
        assert_eq!(f.calendar.list_for_user(&member.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_request_rejected() {
        let f = fixture().await;
        let owner = register(&f, "owner@example.com").await;

        let mut bad = entry("Backwards", None);
        bad.start_date = Some("2024-06-05".to_string());
        let err = f.calendar.create_entry(&owner.id, &bad).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
