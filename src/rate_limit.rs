/// Rate Limiting System
use crate::{
    config::RateLimitConfig,
    error::{AppError, AppResult},
};
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc};

type DirectLimiter = GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>;

fn non_zero(value: u32, fallback: NonZeroU32) -> NonZeroU32 {
    NonZeroU32::new(value).unwrap_or(fallback)
}

/// Rate limiter manager
#[derive(Clone)]
pub struct RateLimiter {
    enabled: bool,
    authenticated: Arc<DirectLimiter>,
    unauthenticated: Arc<DirectLimiter>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let burst = non_zero(config.burst_size, NonZeroU32::MIN.saturating_add(49));

        let auth_quota = Quota::per_second(non_zero(
            config.authenticated_rps,
            NonZeroU32::MIN.saturating_add(99),
        ))
        .allow_burst(burst);

        let unauth_quota = Quota::per_second(non_zero(
            config.unauthenticated_rps,
            NonZeroU32::MIN.saturating_add(9),
        ))
        .allow_burst(non_zero(config.burst_size / 5, NonZeroU32::MIN.saturating_add(9)));

        Self {
            enabled: config.enabled,
            authenticated: Arc::new(GovernorLimiter::direct(auth_quota)),
            unauthenticated: Arc::new(GovernorLimiter::direct(unauth_quota)),
        }
    }

    fn check(&self, limiter: &DirectLimiter) -> AppResult<()> {
        if !self.enabled {
            return Ok(());
        }
        limiter.check().map_err(|_| AppError::RateLimitExceeded {
            retry_after: std::time::Duration::from_secs(1),
        })
    }

    /// Check rate limit for a request carrying credentials
    pub fn check_authenticated(&self) -> AppResult<()> {
        self.check(&self.authenticated)
    }

    /// Check rate limit for an anonymous request
    pub fn check_unauthenticated(&self) -> AppResult<()> {
        self.check(&self.unauthenticated)
    }
}

/// Whether a request presents a session token (bearer header or cookie)
///
/// The token itself is validated later by the extractors.
pub fn carries_session_token(headers: &HeaderMap, cookie_name: &str) -> bool {
    crate::auth::extract_session_token(headers, cookie_name).is_some()
}

/// Rate limiting middleware
///
/// Requests presenting a session token draw from the authenticated quota.
pub async fn rate_limit_middleware(
    State(ctx): State<crate::context::AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if carries_session_token(request.headers(), &ctx.config.sessions.cookie_name) {
        ctx.rate_limiter.check_authenticated()?;
    } else {
        ctx.rate_limiter.check_unauthenticated()?;
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enabled: bool, burst_size: u32) -> RateLimitConfig {
        RateLimitConfig {
            enabled,
            authenticated_rps: 10,
            unauthenticated_rps: 5,
            burst_size,
        }
    }

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(&RateLimitConfig {
            enabled: true,
            authenticated_rps: 100,
            unauthenticated_rps: 10,
            burst_size: 50,
        });

        assert!(limiter.check_authenticated().is_ok());
        assert!(limiter.check_unauthenticated().is_ok());
    }

    #[test]
    fn test_burst_limit() {
        let limiter = RateLimiter::new(&config(true, 5));

        for _ in 0..5 {
            assert!(limiter.check_authenticated().is_ok());
        }

        assert!(matches!(
            limiter.check_authenticated(),
            Err(AppError::RateLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_only_session_tokens_count_as_authenticated() {
        use axum::http::HeaderValue;

        let mut headers = HeaderMap::new();
        assert!(!carries_session_token(&headers, "teamhub_session"));

        headers.insert("authorization", HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert!(!carries_session_token(&headers, "teamhub_session"));

        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        assert!(carries_session_token(&headers, "teamhub_session"));

        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("other=1"));
        assert!(!carries_session_token(&headers, "teamhub_session"));
        headers.insert("cookie", HeaderValue::from_static("teamhub_session=tok"));
        assert!(carries_session_token(&headers, "teamhub_session"));
    }

    #[test]
    fn test_disabled_limiter_always_allows() {
        let limiter = RateLimiter::new(&config(false, 1));
        for _ in 0..100 {
            assert!(limiter.check_unauthenticated().is_ok());
        }
    }
}
