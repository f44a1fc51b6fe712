/// Authentication extractors and utilities
use crate::{
    account::ValidatedSession,
    context::AppContext,
    db::models::User,
    error::{AppError, AppResult},
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Session cookie value, if present
pub fn session_cookie(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

/// Session token from the bearer header, falling back to the cookie
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    extract_bearer_token(headers).or_else(|| session_cookie(headers, cookie_name))
}

/// HttpOnly session cookie carrying `token`
///
/// Browser-session lifetime; expiry is enforced server-side.
pub fn build_session_cookie(ctx: &AppContext, token: String) -> Cookie<'static> {
    Cookie::build((ctx.config.sessions.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(ctx.config.sessions.secure_cookie)
        .build()
}

/// Cookie that clears the session cookie on the client
pub fn removal_cookie(ctx: &AppContext) -> Cookie<'static> {
    Cookie::build((ctx.config.sessions.cookie_name.clone(), ""))
        .path("/")
        .build()
}

/// Authenticated context - resolves the session and loads the user
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub session: ValidatedSession,
}

impl AuthContext {
    async fn resolve(token: &str, state: &AppContext) -> AppResult<Self> {
        let session = state.account_manager.validate_session_token(token).await?;
        let user = match state.account_manager.get_user(&session.user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Authentication("Invalid or expired session".to_string()))
            }
            Err(e) => return Err(e),
        };

        Ok(AuthContext { user, session })
    }
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_session_token(&parts.headers, &state.config.sessions.cookie_name)
            .ok_or_else(|| AppError::Authentication("Authentication required".to_string()))?;

        AuthContext::resolve(&token, state).await
    }
}

/// Optional authenticated context - does not fail if no auth provided
#[derive(Debug, Clone)]
pub struct OptionalAuthContext {
    pub auth: Option<AuthContext>,
    /// Raw token as presented, even when it no longer resolves
    pub token: Option<String>,
}

#[async_trait]
impl FromRequestParts<AppContext> for OptionalAuthContext {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_session_token(&parts.headers, &state.config.sessions.cookie_name);

        let auth = match token.as_deref() {
            Some(token) => match AuthContext::resolve(token, state).await {
                Ok(auth) => Some(auth),
                Err(AppError::Authentication(_)) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };

        Ok(OptionalAuthContext { auth, token })
    }
}
