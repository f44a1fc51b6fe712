/// Health check endpoints for liveness and readiness checks
///
/// `/health` reports overall status including database connectivity;
/// `/health/live` only proves the process answers; `/health/ready` returns
/// 503 while the database is unreachable.

use crate::{context::AppContext, jobs};
use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use serde::{Deserialize, Serialize};

/// Health status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// "ok" or "degraded"
    pub status: String,
    pub version: String,
    /// "connected" or "unavailable"
    pub database: String,
}

/// Build health check routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/health", get(health_basic))
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
}

/// Basic health check
pub async fn health_basic(State(ctx): State<AppContext>) -> Json<HealthStatus> {
    let database_ok = match jobs::tasks::health_check(&ctx).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "health_check: database check failed");
            false
        }
    };

    Json(HealthStatus {
        status: if database_ok { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: if database_ok { "connected" } else { "unavailable" }.to_string(),
    })
}

/// Liveness check
pub async fn liveness() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness check
pub async fn readiness(
    State(ctx): State<AppContext>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if let Err(e) = jobs::tasks::health_check(&ctx).await {
        tracing::warn!(error = %e, "readiness_check_failed: database check failed");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    Ok(Json(serde_json::json!({
        "status": "ready",
        "version": env!("CARGO_PKG_VERSION")
    })))
}
