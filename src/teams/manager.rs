/// Team manager: teams and their membership rows
use super::{CreateTeamRequest, UserRole, MAX_TEAM_NAME_LENGTH};
use crate::{
    db::models::{Team, TeamMember},
    error::{AppError, AppResult},
    invitations::sanitize_input,
};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

pub struct TeamManager {
    db: SqlitePool,
}

impl TeamManager {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Create a team; the creator becomes its team lead
    pub async fn create_team(&self, creator_id: &str, request: &CreateTeamRequest) -> AppResult<Team> {
        let name = sanitize_input(request.name.as_deref().unwrap_or(""));
        if name.is_empty() {
            return Err(AppError::Validation("Team name is required".to_string()));
        }
        if name.chars().count() > MAX_TEAM_NAME_LENGTH {
            return Err(AppError::Validation(format!(
                "Team name must be {} characters or less",
                MAX_TEAM_NAME_LENGTH
            )));
        }
        let description = request
            .description
            .as_deref()
            .map(sanitize_input)
            .filter(|d| !d.is_empty());

        let now = Utc::now();
        let team = Team {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            created_by: creator_id.to_string(),
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.begin().await?;

        sqlx::query(
            "INSERT INTO teams (id, name, description, created_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&team.id)
        .bind(&team.name)
        .bind(&team.description)
        .bind(&team.created_by)
        .bind(team.created_at)
        .bind(team.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO team_members (team_id, user_id, role, joined_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&team.id)
        .bind(creator_id)
        .bind(UserRole::TeamLead.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(team_id = %team.id, creator = %creator_id, "Created team");

        Ok(team)
    }

    pub async fn get_team(&self, team_id: &str) -> AppResult<Team> {
        let row = sqlx::query(
            "SELECT id, name, description, created_by, created_at, updated_at FROM teams WHERE id = ?1",
        )
        .bind(team_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))?;

        Team::from_row(&row)
    }

    /// Teams the user belongs to, oldest first
    pub async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Team>> {
        let rows = sqlx::query(
            "SELECT t.id, t.name, t.description, t.created_by, t.created_at, t.updated_at
             FROM teams t
             JOIN team_members m ON m.team_id = t.id
             WHERE m.user_id = ?1
             ORDER BY t.created_at ASC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(Team::from_row).collect()
    }

    /// Role of a user within a team, if they are a member
    pub async fn get_member_role(&self, team_id: &str, user_id: &str) -> AppResult<Option<UserRole>> {
        let role: Option<String> = sqlx::query_scalar(
            "SELECT role FROM team_members WHERE team_id = ?1 AND user_id = ?2",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;

        role.map(|r| r.parse()).transpose()
    }

    pub async fn list_members(&self, team_id: &str) -> AppResult<Vec<TeamMember>> {
        let rows = sqlx::query(
            "SELECT m.team_id, m.user_id, m.role, m.joined_at, u.email, u.first_name, u.last_name
             FROM team_members m
             JOIN users u ON u.id = m.user_id
             WHERE m.team_id = ?1
             ORDER BY m.joined_at ASC",
        )
        .bind(team_id)
        .fetch_all(&self.db)
        .await?;

        rows.iter().map(TeamMember::from_row).collect()
    }
}
