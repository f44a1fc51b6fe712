/// Metrics and telemetry for teamhub
///
/// Provides Prometheus-compatible metrics for monitoring:
/// - HTTP request counts and latencies
/// - Logins and session cleanup
/// - Invitation creation and responses
/// - Background job execution

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};
use std::time::Instant;

lazy_static! {
    // ========== HTTP Metrics ==========

    /// Total HTTP requests by method, path, and status
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request latencies in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    /// Active HTTP requests
    pub static ref HTTP_REQUESTS_ACTIVE: IntGauge = register_int_gauge!(
        "http_requests_active",
        "Number of HTTP requests currently being processed"
    )
    .unwrap();

    // ========== Account Metrics ==========

    /// Login attempts by outcome
    pub static ref LOGINS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "logins_total",
        "Total number of login attempts",
        &["status"]
    )
    .unwrap();

    /// Expired sessions removed by the cleanup job
    pub static ref SESSIONS_EXPIRED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "sessions_expired_total",
        "Total number of expired sessions removed",
        &["source"]
    )
    .unwrap();

    // ========== Invitation Metrics ==========

    /// Invitations created by invited role
    pub static ref INVITATIONS_CREATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "invitations_created_total",
        "Total number of invitations created",
        &["role"]
    )
    .unwrap();

    /// Invitation responses by action
    pub static ref INVITATION_RESPONSES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "invitation_responses_total",
        "Total number of invitation responses",
        &["action"]
    )
    .unwrap();

    // ========== Background Job Metrics ==========

    /// Background job executions by job type and status
    pub static ref BACKGROUND_JOBS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "background_jobs_total",
        "Total number of background job executions",
        &["job_type", "status"]
    )
    .unwrap();

    /// Background job duration in seconds
    pub static ref BACKGROUND_JOB_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "background_job_duration_seconds",
        "Background job execution time in seconds",
        &["job_type"],
        vec![0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0]
    )
    .unwrap();

    // ========== Error Metrics ==========

    /// Error responses by HTTP status
    pub static ref ERRORS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "errors_total",
        "Total number of error responses",
        &["status"]
    )
    .unwrap();
}

/// Render metrics in Prometheus text format
pub fn render_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration);
}

/// Record a login attempt
pub fn record_login(success: bool) {
    LOGINS_TOTAL
        .with_label_values(&[if success { "success" } else { "failure" }])
        .inc();
}

/// Record removed expired sessions
pub fn record_sessions_expired(source: &str, count: u64) {
    SESSIONS_EXPIRED_TOTAL
        .with_label_values(&[source])
        .inc_by(count);
}

/// Record a created invitation
pub fn record_invitation_created(role: &str) {
    INVITATIONS_CREATED_TOTAL.with_label_values(&[role]).inc();
}

/// Record an accept/decline
pub fn record_invitation_response(action: &str) {
    INVITATION_RESPONSES_TOTAL.with_label_values(&[action]).inc();
}

/// Record a background job execution
pub fn record_background_job(job_type: &str, status: &str, duration: f64) {
    BACKGROUND_JOBS_TOTAL
        .with_label_values(&[job_type, status])
        .inc();
    BACKGROUND_JOB_DURATION_SECONDS
        .with_label_values(&[job_type])
        .observe(duration);
}

/// Record an error response
pub fn record_error(status: u16) {
    ERRORS_TOTAL.with_label_values(&[&status.to_string()]).inc();
}

/// Per-request metrics middleware
///
/// Labels use the matched route template so ids do not explode cardinality.
pub async fn track_metrics(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    HTTP_REQUESTS_ACTIVE.inc();
    let start = Instant::now();
    let response = next.run(request).await;
    HTTP_REQUESTS_ACTIVE.dec();

    record_http_request(
        &method,
        &path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_http_request() {
        record_http_request("GET", "/api/teams", 200, 0.05);
        let metrics = render_metrics();
        assert!(metrics.contains("http_requests_total"));
        assert!(metrics.contains("http_request_duration_seconds"));
    }

    #[test]
    fn test_record_background_job() {
        record_background_job("session_cleanup", "success", 0.2);
        let metrics = render_metrics();
        assert!(metrics.contains("background_jobs_total"));
        assert!(metrics.contains("background_job_duration_seconds"));
    }

    #[test]
    fn test_record_invitation_metrics() {
        record_invitation_created("team_member");
        record_invitation_response("accept");
        let metrics = render_metrics();
        assert!(metrics.contains("invitations_created_total"));
        assert!(metrics.contains("invitation_responses_total"));
    }

    #[test]
    fn test_record_login_and_errors() {
        record_login(true);
        record_login(false);
        record_error(401);
        let metrics = render_metrics();
        assert!(metrics.contains("logins_total"));
        assert!(metrics.contains("errors_total"));
    }
}
