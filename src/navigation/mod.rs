/// Client-side session and navigation glue
///
/// A front end embeds a [`Navigator`] with three collaborators: an
/// [`AuthApi`] that talks to the server, a [`SessionStore`] holding whatever
/// the client caches about the signed-in user, and a [`NavigationView`]
/// that renders and redirects. [`client::HttpAuthClient`] is the `reqwest`
/// implementation of `AuthApi`.

pub mod client;

pub use client::{validate_login_form, ClientError, HttpAuthClient, LOGIN_FAILED_MESSAGE};

use crate::account::{SessionStatus, UserSummary};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Where unauthenticated users are sent
pub const LOGIN_PATH: &str = "/login";

/// Server calls made by the navigation glue
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Ask the server whether the current session is still valid
    async fn check_session_status(&self) -> Result<SessionStatus, ClientError>;

    /// End the current session on the server
    async fn logout(&self) -> Result<(), ClientError>;
}

/// Locally cached session state
pub trait SessionStore: Send + Sync {
    fn clear_session_info(&self);
}

/// Rendering and navigation side effects
pub trait NavigationView: Send + Sync {
    fn display_user_info(&self, container_id: &str, user: &UserSummary);
    fn attach_logout_control(&self, container_id: &str);
    fn show_auth_error(&self, message: &str);
    fn redirect_to(&self, path: &str);
}

/// What a navigation call ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// Session valid; user info shown and logout wired
    Authenticated(UserSummary),
    /// Server reported no valid session; redirected to login
    SessionInvalid,
    /// Session check itself failed; error shown and redirected to login
    AuthError(String),
    /// Local session cleared; `server_confirmed` is false when the logout
    /// call failed
    LoggedOut { server_confirmed: bool },
}

/// Drives session checks and logout against injected collaborators
pub struct Navigator<A, S, V> {
    api: A,
    store: S,
    view: V,
}

impl<A, S, V> Navigator<A, S, V>
where
    A: AuthApi,
    S: SessionStore,
    V: NavigationView,
{
    pub fn new(api: A, store: S, view: V) -> Self {
        Self { api, store, view }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Check the session and set up the navigation container
    pub async fn initialize_navigation(&self, container_id: &str) -> NavigationOutcome {
        match self.api.check_session_status().await {
            Ok(SessionStatus {
                valid: true,
                user: Some(user),
            }) => {
                self.view.display_user_info(container_id, &user);
                self.view.attach_logout_control(container_id);
                debug!(user_id = %user.id, "Navigation initialized");
                NavigationOutcome::Authenticated(user)
            }
            Ok(_) => {
                self.store.clear_session_info();
                self.view.redirect_to(LOGIN_PATH);
                NavigationOutcome::SessionInvalid
            }
            Err(e) => self.handle_auth_error(&e),
        }
    }

    /// Log out; local state is cleared whatever the server says
    pub async fn handle_logout(&self) -> NavigationOutcome {
        let server_confirmed = match self.api.logout().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Logout request failed; clearing local session anyway");
                false
            }
        };

        self.store.clear_session_info();
        self.view.redirect_to(LOGIN_PATH);

        NavigationOutcome::LoggedOut { server_confirmed }
    }

    fn handle_auth_error(&self, error: &ClientError) -> NavigationOutcome {
        warn!(error = %error, "Session check failed");
        let message = error.to_string();

        self.store.clear_session_info();
        self.view.show_auth_error(&message);
        self.view.redirect_to(LOGIN_PATH);

        NavigationOutcome::AuthError(message)
    }
}
