/// Configuration management for the teamhub server
use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub service: ServiceConfig,
    pub storage: StorageConfig,
    pub sessions: SessionConfig,
    pub invitations: InvitationConfig,
    pub email: Option<EmailConfig>,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// Log filter used when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "teamhub=debug,tower_http=debug";

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub hostname: String,
    pub port: u16,
    /// Public base URL used in invitation links
    pub public_url: String,
    /// Origins allowed to send credentialed requests (comma-separated)
    pub allowed_origins: Vec<String>,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    pub database: PathBuf,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_hours: i64,
    /// Mark the session cookie `Secure` (HTTPS only)
    pub secure_cookie: bool,
}

/// Invitation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationConfig {
    pub expiry_days: i64,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_url: String,
    pub from_address: String,
}

/// Rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub authenticated_rps: u32,
    pub unauthenticated_rps: u32,
    pub burst_size: u32,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directives
    pub level: String,
    pub format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let hostname = env::var("TEAMHUB_HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("TEAMHUB_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| AppError::Validation("Invalid port number".to_string()))?;
        let public_url = env::var("TEAMHUB_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://{}:{}", hostname, port));
        let allowed_origins = env::var("TEAMHUB_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| public_url.clone())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let data_directory: PathBuf = env::var("TEAMHUB_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let database = env::var("TEAMHUB_DATABASE_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("teamhub.sqlite"));

        let cookie_name = env::var("TEAMHUB_SESSION_COOKIE")
            .unwrap_or_else(|_| "teamhub_session".to_string());
        let ttl_hours = env::var("TEAMHUB_SESSION_TTL_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24);
        let secure_cookie = env::var("TEAMHUB_SESSION_SECURE_COOKIE")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .unwrap_or(false);

        let expiry_days = env::var("TEAMHUB_INVITATION_EXPIRY_DAYS")
            .unwrap_or_else(|_| crate::invitations::DEFAULT_INVITATION_EXPIRY_DAYS.to_string())
            .parse()
            .unwrap_or(crate::invitations::DEFAULT_INVITATION_EXPIRY_DAYS);

        let email = if let Ok(smtp_url) = env::var("TEAMHUB_EMAIL_SMTP_URL") {
            Some(EmailConfig {
                smtp_url,
                from_address: env::var("TEAMHUB_EMAIL_FROM_ADDRESS")
                    .unwrap_or_else(|_| format!("noreply@{}", hostname)),
            })
        } else {
            None
        };

        let rate_limit_enabled = env::var("TEAMHUB_RATE_LIMITS_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        let authenticated_rps = env::var("TEAMHUB_RATE_LIMIT_AUTHENTICATED_RPS")
            .unwrap_or_else(|_| "100".to_string())
            .parse()
            .unwrap_or(100);
        let unauthenticated_rps = env::var("TEAMHUB_RATE_LIMIT_UNAUTHENTICATED_RPS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);
        let burst_size = env::var("TEAMHUB_RATE_LIMIT_BURST")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .unwrap_or(50);

        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
        let log_format = match env::var("TEAMHUB_LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(ServerConfig {
            service: ServiceConfig {
                hostname,
                port,
                public_url,
                allowed_origins,
            },
            storage: StorageConfig {
                data_directory,
                database,
            },
            sessions: SessionConfig {
                cookie_name,
                ttl_hours,
                secure_cookie,
            },
            invitations: InvitationConfig { expiry_days },
            email,
            rate_limit: RateLimitConfig {
                enabled: rate_limit_enabled,
                authenticated_rps,
                unauthenticated_rps,
                burst_size,
            },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.service.hostname.is_empty() {
            return Err(AppError::Validation("Hostname cannot be empty".to_string()));
        }

        if self.sessions.cookie_name.is_empty() {
            return Err(AppError::Validation(
                "Session cookie name cannot be empty".to_string(),
            ));
        }

        if self.sessions.ttl_hours <= 0 {
            return Err(AppError::Validation(
                "Session TTL must be at least one hour".to_string(),
            ));
        }

        if self.invitations.expiry_days <= 0 {
            return Err(AppError::Validation(
                "Invitation expiry must be at least one day".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for ServerConfig {
    /// Local development defaults; also used by tests
    fn default() -> Self {
        let data_directory = PathBuf::from("./data");
        Self {
            service: ServiceConfig {
                hostname: "localhost".to_string(),
                port: 3000,
                public_url: "http://localhost:3000".to_string(),
                allowed_origins: vec!["http://localhost:3000".to_string()],
            },
            storage: StorageConfig {
                database: data_directory.join("teamhub.sqlite"),
                data_directory,
            },
            sessions: SessionConfig {
                cookie_name: "teamhub_session".to_string(),
                ttl_hours: 24,
                secure_cookie: false,
            },
            invitations: InvitationConfig {
                expiry_days: crate::invitations::DEFAULT_INVITATION_EXPIRY_DAYS,
            },
            email: None,
            rate_limit: RateLimitConfig {
                enabled: true,
                authenticated_rps: 100,
                unauthenticated_rps: 10,
                burst_size: 50,
            },
            logging: LoggingConfig {
                level: DEFAULT_LOG_FILTER.to_string(),
                format: LogFormat::Pretty,
            },
        }
    }
}
