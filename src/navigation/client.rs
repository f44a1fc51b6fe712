/// HTTP implementation of the client-side auth calls
use super::AuthApi;
use crate::{
    account::{LoginResponse, SessionStatus},
    invitations::validation::is_valid_email,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, warn};

/// Shown for any login failure so the form never reveals which part was wrong
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please check your credentials and try again.";

/// Client-side errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    /// Login form rejected before any request was sent
    #[error("{}", .0.join("; "))]
    InvalidForm(Vec<String>),

    #[error("{}", LOGIN_FAILED_MESSAGE)]
    LoginFailed,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

/// Check the login form; returns every problem found, empty when valid
pub fn validate_login_form(email: &str, password: &str) -> Vec<String> {
    let mut errors = Vec::new();

    let email = email.trim();
    if email.is_empty() {
        errors.push("Email is required".to_string());
    } else if !is_valid_email(email) {
        errors.push("Please enter a valid email address".to_string());
    }

    if password.is_empty() {
        errors.push("Password is required".to_string());
    }

    errors
}

/// `reqwest` client that keeps the session cookie between calls
#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    http: Client,
    base_url: String,
}

impl HttpAuthClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Validate the form, then sign in; the session cookie is kept for
    /// subsequent calls
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ClientError> {
        let errors = validate_login_form(email, password);
        if !errors.is_empty() {
            return Err(ClientError::InvalidForm(errors));
        }

        let response = self
            .http
            .post(self.url("/api/users/login"))
            .json(&json!({ "email": email.trim(), "password": password }))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Login request failed");
                ClientError::LoginFailed
            })?;

        if !response.status().is_success() {
            debug!(status = %response.status(), "Login rejected");
            return Err(ClientError::LoginFailed);
        }

        response.json::<LoginResponse>().await.map_err(|e| {
            warn!(error = %e, "Unreadable login response");
            ClientError::LoginFailed
        })
    }
}

#[async_trait]
impl AuthApi for HttpAuthClient {
    async fn check_session_status(&self) -> Result<SessionStatus, ClientError> {
        let response = self.http.get(self.url("/api/users/session")).send().await?;

        match response.status() {
            // An invalid session is an answer, not a failure
            StatusCode::OK | StatusCode::UNAUTHORIZED => Ok(response.json().await?),
            status => Err(unexpected(status, response).await),
        }
    }

    async fn logout(&self) -> Result<(), ClientError> {
        let response = self.http.post(self.url("/api/users/logout")).send().await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(unexpected(response.status(), response).await)
        }
    }
}

async fn unexpected(status: StatusCode, response: reqwest::Response) -> ClientError {
    let message = response
        .json::<MessageBody>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Unknown error").to_string());

    ClientError::UnexpectedStatus {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_login_form() {
        assert!(validate_login_form("alice@example.com", "secret").is_empty());
        assert_eq!(
            validate_login_form("", ""),
            vec!["Email is required", "Password is required"]
        );
        assert_eq!(
            validate_login_form("not-an-email", "secret"),
            vec!["Please enter a valid email address"]
        );
        assert_eq!(validate_login_form("   ", "x"), vec!["Email is required"]);
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = HttpAuthClient::new("http://localhost:3000/").unwrap();
        assert_eq!(
            client.url("/api/users/login"),
            "http://localhost:3000/api/users/login"
        );
    }

    #[tokio::test]
    async fn test_invalid_form_sends_nothing() {
        // Nothing listens here; an attempted request would surface as LoginFailed
        let client = HttpAuthClient::new("http://127.0.0.1:9").unwrap();
        match client.login("", "pw").await {
            Err(ClientError::InvalidForm(errors)) => {
                assert_eq!(errors, vec!["Email is required"])
            }
            other => panic!("expected form error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_network_failure_is_generic_login_failure() {
        let client = HttpAuthClient::new("http://127.0.0.1:9").unwrap();
        let err = client
            .login("alice@example.com", "password123")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), LOGIN_FAILED_MESSAGE);
    }
}
