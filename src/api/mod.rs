/// API routes and handlers
pub mod calendar;
pub mod extract;
pub mod health;
pub mod invitations;
pub mod teams;
pub mod users;

use crate::context::AppContext;
use axum::Router;

/// Build API routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .merge(health::routes())
        .merge(users::routes())
        .merge(teams::routes())
        .merge(invitations::routes())
        .merge(calendar::routes())
}
