/// Application context and dependency injection
use crate::{
    account::AccountManager,
    calendar::CalendarManager,
    config::ServerConfig,
    db,
    error::{AppError, AppResult},
    invitations::InvitationManager,
    mailer::Mailer,
    rate_limit::RateLimiter,
    teams::TeamManager,
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub db: SqlitePool,
    pub account_manager: Arc<AccountManager>,
    pub team_manager: Arc<TeamManager>,
    pub invitation_manager: Arc<InvitationManager>,
    pub calendar_manager: Arc<CalendarManager>,
    // Rate limiter
    pub rate_limiter: Arc<RateLimiter>,
    // Email mailer
    pub mailer: Arc<Mailer>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> AppResult<Self> {
        // Validate configuration
        config.validate()?;

        // Create data directories if they don't exist
        Self::ensure_directories(&config).await?;

        let pool = db::create_pool(&config.storage.database, db::DatabaseOptions::default()).await?;

        db::run_migrations(&pool).await?;
        db::test_connection(&pool).await?;

        let mailer = Mailer::new(config.email.clone())?;

        Ok(Self::assemble(config, pool, mailer))
    }

    /// Build a context around an existing pool (schema must be applied)
    pub fn with_pool(config: ServerConfig, pool: SqlitePool) -> AppResult<Self> {
        config.validate()?;
        let mailer = Mailer::new(config.email.clone())?;
        Ok(Self::assemble(config, pool, mailer))
    }

    fn assemble(config: ServerConfig, pool: SqlitePool, mailer: Mailer) -> Self {
        let config = Arc::new(config);

        let account_manager = Arc::new(AccountManager::new(pool.clone(), Arc::clone(&config)));
        let team_manager = Arc::new(TeamManager::new(pool.clone()));
        let invitation_manager = Arc::new(InvitationManager::new(
            pool.clone(),
            config.invitations.expiry_days,
        ));
        let calendar_manager = Arc::new(CalendarManager::new(pool.clone()));
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        Self {
            config,
            db: pool,
            account_manager,
            team_manager,
            invitation_manager,
            calendar_manager,
            rate_limiter,
            mailer: Arc::new(mailer),
        }
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &ServerConfig) -> AppResult<()> {
        let dir = &config.storage.data_directory;
        if !dir.exists() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                AppError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
            })?;
        }

        Ok(())
    }

    /// Get service URL
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
