/// /api/calendar-entries endpoints
use crate::{
    api::extract::ApiJson,
    auth::AuthContext,
    calendar::{CalendarEntry, CalendarEntryRequest},
    context::AppContext,
    error::AppResult,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

/// Build calendar routes
pub fn routes() -> Router<AppContext> {
    Router::new()
        .route("/api/calendar-entries", get(list_entries).post(create_entry))
        .route(
            "/api/calendar-entries/:entry_id",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
}

async fn list_entries(
    State(ctx): State<AppContext>,
    auth: AuthContext,
) -> AppResult<Json<Vec<CalendarEntry>>> {
    Ok(Json(ctx.calendar_manager.list_for_user(&auth.user.id).await?))
}

async fn get_entry(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(entry_id): Path<String>,
) -> AppResult<Json<CalendarEntry>> {
    Ok(Json(
        ctx.calendar_manager.get_entry(&entry_id, &auth.user.id).await?,
    ))
}

async fn create_entry(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    ApiJson(req): ApiJson<CalendarEntryRequest>,
) -> AppResult<(StatusCode, Json<CalendarEntry>)> {
    let entry = ctx.calendar_manager.create_entry(&auth.user.id, &req).await?;
    tracing::debug!(entry_id = %entry.id, "Created calendar entry");
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(entry_id): Path<String>,
    ApiJson(req): ApiJson<CalendarEntryRequest>,
) -> AppResult<Json<CalendarEntry>> {
    Ok(Json(
        ctx.calendar_manager
            .update_entry(&entry_id, &auth.user.id, &req)
            .await?,
    ))
}

async fn delete_entry(
    State(ctx): State<AppContext>,
    auth: AuthContext,
    Path(entry_id): Path<String>,
) -> AppResult<StatusCode> {
    ctx.calendar_manager
        .delete_entry(&entry_id, &auth.user.id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
