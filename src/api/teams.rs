/// /api/teams endpoints
use crate::{
    api::extract::ApiJson,
    auth::AuthContext,
    context::AppContext,
    db::models::{Team, TeamMember},
    error::{AppError, AppResult},
    invitations::FormattedInvitation,
    teams::{CreateTeamRequest, UserRole},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

/// Build team routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/teams", get(list_teams).post(create_team))
        .route("/api/teams/:team_id", get(get_team))
        .route("/api/teams/:team_id/members", get(list_members))
        .route("/api/teams/:team_id/invitations", get(list_invitations))
}

async fn list_teams(State(ctx): State<AppContext>, auth: AuthContext) -> AppResult<Json<Vec<Team>>> {
    Ok(Json(ctx.team_manager.list_for_user(&auth.user.id).await?))
}

async fn create_team(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    ApiJson(req): ApiJson<CreateTeamRequest>,
) -> AppResult<(StatusCode, Json<Team>)> {
    let team = ctx.team_manager.create_team(&auth.user.id, &req).await?;
    Ok((StatusCode::CREATED, Json(team)))
}

/// Caller's role in the team; outsiders get a 404 so team ids do not leak
async fn require_member(ctx: &AppContext, team_id: &str, user_id: &str) -> AppResult<UserRole> {
    ctx.team_manager
        .get_member_role(team_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Team not found".to_string()))
}

async fn get_team(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(team_id): Path<String>,
) -> AppResult<Json<Team>> {
    require_member(&ctx, &team_id, &auth.user.id).await?;
    Ok(Json(ctx.team_manager.get_team(&team_id).await?))
}

async fn list_members(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(team_id): Path<String>,
) -> AppResult<Json<Vec<TeamMember>>> {
    require_member(&ctx, &team_id, &auth.user.id).await?;
    Ok(Json(ctx.team_manager.list_members(&team_id).await?))
}

async fn list_invitations(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(team_id): Path<String>,
) -> AppResult<Json<Vec<FormattedInvitation>>> {
    let role = require_member(&ctx, &team_id, &auth.user.id).await?;
    if !role.can_invite() {
        return Err(AppError::Authorization(
            "Only team leads can view team invitations".to_string(),
        ));
    }

    Ok(Json(ctx.invitation_manager.list_for_team(&team_id).await?))
}
