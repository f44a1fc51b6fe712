/// /api/invitations endpoints
///
/// Inbound requests are sanitized, then validated; structural problems are
/// answered with `400 {isValid: false, errors: [...]}` before any lookup.
use crate::{
    api::extract::ApiJson,
    auth::AuthContext,
    context::AppContext,
    error::{AppError, AppResult},
    invitations::{
        sanitize_input, sanitize_invitation_data, validate_invitation_data,
        validate_invitation_response, FormattedInvitation, InvitationAction, InvitationData,
        InvitationResponse, NewInvitation,
    },
    metrics,
    teams::UserRole,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

/// Build invitation routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/invitations", post(create_invitation))
        .route("/api/invitations/pending", get(list_pending))
        .route("/api/invitations/respond", post(respond_to_invitation))
        .route("/api/invitations/:token", get(get_invitation))
}

async fn create_invitation(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    ApiJson(data): ApiJson<InvitationData>,
) -> AppResult<Response> {
    let mut data = sanitize_invitation_data(&data);
    if data.invited_by.as_deref().map_or(true, str::is_empty) {
        data.invited_by = Some(auth.user.id.clone());
    }

    let outcome = validate_invitation_data(&data);
    if !outcome.is_valid {
        return Ok((StatusCode::BAD_REQUEST, Json(outcome)).into_response());
    }

    let (Some(team_id), Some(invited_email), Some(invited_by), Some(role)) =
        (data.team_id, data.invited_email, data.invited_by, data.role)
    else {
        return Err(AppError::Internal("Validated invitation is incomplete".to_string()));
    };

    if invited_by != auth.user.id {
        return Err(AppError::Authorization(
            "You can only send invitations as yourself".to_string(),
        ));
    }
    let role: UserRole = role.parse()?;

    let record = ctx
        .invitation_manager
        .create_invitation(NewInvitation {
            team_id,
            invited_email,
            invited_by,
            role,
        })
        .await?;
    metrics::record_invitation_created(role.as_str());

    let formatted = ctx.invitation_manager.format(&record).await?;

    if let Err(e) = ctx
        .mailer
        .send_invitation_email(&formatted, &record.token, &ctx.config.service.public_url)
        .await
    {
        // The invitation stands even if the email could not be delivered
        tracing::warn!("Failed to send invitation email: {}", e);
    }

    Ok((StatusCode::CREATED, Json(formatted)).into_response())
}

async fn list_pending(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> AppResult<Json<Vec<FormattedInvitation>>> {
    Ok(Json(
        ctx.invitation_manager
            .list_pending_for_email(&auth.user.email)
            .await?,
    ))
}

/// Visible to the invitee and to the team's leads
async fn get_invitation(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(token): Path<String>,
) -> AppResult<Json<FormattedInvitation>> {
    let record = ctx.invitation_manager.get_by_token(&token).await?;

    let is_invitee = record.invited_email.eq_ignore_ascii_case(&auth.user.email);
    let is_lead = ctx
        .team_manager
        .get_member_role(&record.team_id, &auth.user.id)
        .await?
        .map_or(false, |role| role.can_invite());
    if !is_invitee && !is_lead {
        return Err(AppError::NotFound("Invitation not found".to_string()));
    }

    Ok(Json(ctx.invitation_manager.format(&record).await?))
}

async fn respond_to_invitation(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    ApiJson(response): ApiJson<InvitationResponse>,
) -> AppResult<Response> {
    let response = InvitationResponse {
        token: response.token.as_deref().map(sanitize_input),
        action: response.action.as_deref().map(sanitize_input),
    };

    let outcome = validate_invitation_response(&response);
    if !outcome.is_valid {
        return Ok((StatusCode::BAD_REQUEST, Json(outcome)).into_response());
    }

    let token = response.token.unwrap_or_default();
    let action: InvitationAction = response.action.unwrap_or_default().parse()?;

    let record = ctx
        .invitation_manager
        .respond(&token, action, &auth.user)
        .await?;
    metrics::record_invitation_response(action.as_str());

    let formatted = ctx.invitation_manager.format(&record).await?;

    Ok(Json(json!({
        "message": format!("Invitation {}", record.status),
        "invitation": formatted,
    }))
    .into_response())
}
