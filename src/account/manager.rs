/// Account manager implementation using runtime queries
/// This version uses sqlx runtime query building instead of compile-time macros
/// to avoid needing DATABASE_URL during compilation

use crate::{
    account::{password::PasswordHasher, NewSession, RegisterRequest, ValidatedSession},
    config::ServerConfig,
    db::models::{Session, User},
    error::{AppError, AppResult},
    invitations::token::random_hex_token,
    profile::SanitizedProfile,
    teams::UserRole,
};
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Session tokens carry 256 bits of entropy, like invitation tokens
const SESSION_TOKEN_BYTES: usize = 32;

const USER_COLUMNS: &str =
    "id, email, password_hash, first_name, last_name, role, created_at, updated_at";

/// Only the SHA-256 of a session token is stored
pub fn hash_session_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
    config: Arc<ServerConfig>,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool, config: Arc<ServerConfig>) -> Self {
        Self { db, config }
    }

    /// Register a new user
    pub async fn register(&self, request: RegisterRequest) -> AppResult<User> {
        request
            .validate()
            .map_err(|e| AppError::Validation(super::validation_message(&e)))?;

        let email = request.email.trim().to_lowercase();
        if self.email_exists(&email, None).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password_hash = PasswordHasher::hash(&request.password)?;

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            password_hash,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            role: UserRole::BasicUser,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, first_name, last_name, role, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.db)
        .await?;

        tracing::info!(user_id = %user.id, "Registered new user");

        Ok(user)
    }

    /// Authenticate by email and password and create a session
    ///
    /// Unknown email and wrong password produce the same error and both pay
    /// for an Argon2 verification.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(User, NewSession)> {
        let invalid = || AppError::Authentication("Invalid email or password".to_string());

        let user = match self.get_user_by_email(email).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                PasswordHasher::verify_dummy(password);
                return Err(invalid());
            }
            Err(e) => return Err(e),
        };

        if !PasswordHasher::verify(password, &user.password_hash)? {
            return Err(invalid());
        }

        let session = self.create_session(&user.id).await?;

        Ok((user, session))
    }

    /// Create a session for a user
    pub async fn create_session(&self, user_id: &str) -> AppResult<NewSession> {
        let token = random_hex_token(SESSION_TOKEN_BYTES);
        let now = Utc::now();

        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            token_hash: hash_session_token(&token),
            created_at: now,
            expires_at: now + Duration::hours(self.config.sessions.ttl_hours),
        };

        sqlx::query(
            "INSERT INTO sessions (id, user_id, token_hash, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&session.id)
        .bind(&session.user_id)
        .bind(&session.token_hash)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.db)
        .await?;

        Ok(NewSession { token, session })
    }

    /// Resolve a presented session token
    pub async fn validate_session_token(&self, token: &str) -> AppResult<ValidatedSession> {
        let row = sqlx::query("SELECT id, user_id, expires_at FROM sessions WHERE token_hash = ?1")
            .bind(hash_session_token(token))
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid or expired session".to_string()))?;

        let session_id: String = row.try_get("id")?;
        let user_id: String = row.try_get("user_id")?;
        let expires_at: chrono::DateTime<Utc> = row.try_get("expires_at")?;

        if expires_at <= Utc::now() {
            self.delete_session(&session_id).await?;
            return Err(AppError::Authentication("Session expired".to_string()));
        }

        Ok(ValidatedSession {
            session_id,
            user_id,
        })
    }

    /// Delete a session (logout)
    pub async fn delete_session(&self, session_id: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(session_id)
            .execute(&self.db)
            .await?;

        Ok(())
    }

    pub async fn delete_session_by_token(&self, token: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?1")
            .bind(hash_session_token(token))
            .execute(&self.db)
            .await?;

        Ok(())
    }

    /// Remove every session past its expiry, returning how many were removed
    pub async fn cleanup_expired_sessions(&self) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(Utc::now())
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    /// Get user by id
    pub async fn get_user(&self, user_id: &str) -> AppResult<User> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        User::from_row(&row)
    }

    /// Get user by email (case-insensitive)
    pub async fn get_user_by_email(&self, email: &str) -> AppResult<User> {
        let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS))
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        User::from_row(&row)
    }

    /// Apply a validated profile edit
    pub async fn update_profile(&self, user_id: &str, profile: &SanitizedProfile) -> AppResult<User> {
        let email = profile.email.to_lowercase();
        if self.email_exists(&email, Some(user_id)).await? {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let result = sqlx::query(
            "UPDATE users SET first_name = ?1, last_name = ?2, email = ?3, updated_at = ?4 WHERE id = ?5",
        )
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&email)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        self.get_user(user_id).await
    }

    /// Check if an email is taken, optionally ignoring one user
    async fn email_exists(&self, email: &str, except_user: Option<&str>) -> AppResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?1 AND id != ?2")
                .bind(email)
                .bind(except_user.unwrap_or(""))
                .fetch_one(&self.db)
                .await?;

        Ok(count > 0)
    }
}
