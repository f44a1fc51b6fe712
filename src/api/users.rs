/// /api/users endpoints: registration, login/logout, session, profile
use crate::{
    api::extract::ApiJson,
    account::{validation_message, LoginRequest, LoginResponse, RegisterRequest, SessionStatus, UserSummary},
    auth::{build_session_cookie, removal_cookie, AuthContext, OptionalAuthContext},
    context::AppContext,
    error::{AppError, AppResult},
    metrics,
    profile::{validate_profile_form_data, ProfileFormData},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde_json::json;
use validator::Validate;

/// Build user routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
        .route("/api/users/logout", post(logout))
        .route("/api/users/session", get(session_status))
        .route("/api/users/profile", get(get_profile).put(update_profile))
}

async fn register(
    State(ctx): State<AppContext>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<LoginResponse>)> {
    let user = ctx.account_manager.register(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            message: "Registration successful".to_string(),
            user: UserSummary::from(&user),
        }),
    ))
}

/// Login endpoint; sets the session cookie and also returns the user
async fn login(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    req.validate()
        .map_err(|e| AppError::Validation(validation_message(&e)))?;

    let (user, new_session) = match ctx.account_manager.login(&req.email, &req.password).await {
        Ok(result) => result,
        Err(e) => {
            metrics::record_login(false);
            tracing::info!("login: rejected attempt: {}", e);
            return Err(e);
        }
    };
    metrics::record_login(true);
    tracing::info!(user_id = %user.id, "login: session created");

    let jar = jar.add(build_session_cookie(&ctx, new_session.token));

    Ok((
        jar,
        Json(LoginResponse {
            message: "Login successful".to_string(),
            user: UserSummary::from(&user),
        }),
    ))
}

/// Logout always succeeds and clears the cookie, even without a live session
async fn logout(
    State(ctx): State<AppContext>,
    jar: CookieJar,
    auth: OptionalAuthContext,
) -> (CookieJar, Json<serde_json::Value>) {
    if let Some(token) = auth.token.as_deref() {
        if let Err(e) = ctx.account_manager.delete_session_by_token(token).await {
            tracing::warn!("logout: failed to delete session: {}", e);
        }
    }

    (
        jar.remove(removal_cookie(&ctx)),
        Json(json!({ "message": "Logged out successfully" })),
    )
}

async fn session_status(auth: OptionalAuthContext) -> Response {
    match auth.auth {
        Some(auth) => Json(SessionStatus {
            valid: true,
            user: Some(UserSummary::from(&auth.user)),
        })
        .into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(SessionStatus {
                valid: false,
                user: None,
            }),
        )
            .into_response(),
    }
}

async fn get_profile(auth: AuthContext) -> Json<UserSummary> {
    Json(UserSummary::from(&auth.user))
}

/// Profile update; validation failures return the field-keyed error map
async fn update_profile(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    ApiJson(form): ApiJson<ProfileFormData>,
) -> AppResult<Response> {
    let validation = validate_profile_form_data(&form);
    if !validation.is_valid {
        return Ok((StatusCode::BAD_REQUEST, Json(validation)).into_response());
    }
    let profile = validation
        .sanitized_data
        .ok_or_else(|| AppError::Internal("Valid profile without sanitized data".to_string()))?;

    let user = ctx.account_manager.update_profile(&auth.user.id, &profile).await?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "user": UserSummary::from(&user),
    }))
    .into_response())
}
