/// Background task implementations
use crate::{context::AppContext, error::AppResult, metrics};

/// Cleanup expired sessions
pub async fn cleanup_expired_sessions(ctx: &AppContext) -> AppResult<u64> {
    let deleted = ctx.account_manager.cleanup_expired_sessions().await?;
    metrics::record_sessions_expired("cleanup_job", deleted);
    Ok(deleted)
}

/// Health check - verify the database answers
pub async fn health_check(ctx: &AppContext) -> AppResult<()> {
    sqlx::query("SELECT 1").fetch_one(&ctx.db).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        account::RegisterRequest,
        config::ServerConfig,
        db,
    };
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_cleanup_removes_only_expired_sessions() {
        let pool = db::create_memory_pool().await.unwrap();
        let ctx = AppContext::with_pool(ServerConfig::default(), pool).unwrap();

        let user = ctx
            .account_manager
            .register(RegisterRequest {
                email: "jobs@example.com".to_string(),
                password: "password123".to_string(),
                first_name: "Job".to_string(),
                last_name: "Runner".to_string(),
            })
            .await
            .unwrap();
        let live = ctx.account_manager.create_session(&user.id).await.unwrap();
        let stale = ctx.account_manager.create_session(&user.id).await.unwrap();

        sqlx::query("UPDATE sessions SET expires_at = ?1 WHERE id = ?2")
            .bind(Utc::now() - Duration::hours(1))
            .bind(&stale.session.id)
            .execute(&ctx.db)
            .await
            .unwrap();

        assert_eq!(cleanup_expired_sessions(&ctx).await.unwrap(), 1);
        assert_eq!(cleanup_expired_sessions(&ctx).await.unwrap(), 0);
        assert!(ctx.account_manager.validate_session_token(&live.token).await.is_ok());
    }

    #[tokio::test]
    async fn test_health_check() {
        let pool = db::create_memory_pool().await.unwrap();
        let ctx = AppContext::with_pool(ServerConfig::default(), pool).unwrap();
        assert!(health_check(&ctx).await.is_ok());
    }
}
