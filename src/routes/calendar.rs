//! Calendar event routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use super::{ApiError, store_error};
use crate::models::{CalendarEvent, CalendarEventPatch, NewCalendarEvent};
use crate::routes::auth::AuthUser;
use crate::services::calendar::{self as svc, EventRange};
use crate::state::AppState;

/// `GET /api/events?from=&to=&clientId=`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(range): Query<EventRange>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let rows = svc::list_events(&state.pool, &auth.caller, &range)
        .await
        .map_err(store_error)?;
    Ok(Json(rows))
}

/// `POST /api/events`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewCalendarEvent>,
) -> Result<(StatusCode, Json<CalendarEvent>), ApiError> {
    let row = svc::create_event(&state.pool, &auth.caller, &body)
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `PATCH /api/events/:id`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CalendarEventPatch>,
) -> Result<Json<CalendarEvent>, ApiError> {
    let row = svc::update_event(&state.pool, &auth.caller, id, &body)
        .await
        .map_err(store_error)?;
    Ok(Json(row))
}

/// `DELETE /api/events/:id`
pub async fn delete(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    svc::delete_event(&state.pool, &auth.caller, id).await.map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}
