//! Tag routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use super::{ApiError, store_error};
use crate::models::{NewTag, Tag, TagPatch};
use crate::routes::auth::AuthUser;
use crate::services::tags as svc;
use crate::state::AppState;

/// `GET /api/tags`
pub async fn list(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<Tag>>, ApiError> {
    let rows = svc::list_tags(&state.pool, &auth.caller).await.map_err(store_error)?;
    Ok(Json(rows))
}

/// `POST /api/tags`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewTag>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let row = svc::create_tag(&state.pool, &auth.caller, &body)
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `PATCH /api/tags/:id`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<TagPatch>,
) -> Result<Json<Tag>, ApiError> {
    let row = svc::update_tag(&state.pool, &auth.caller, id, &body)
        .await
        .map_err(store_error)?;
    Ok(Json(row))
}

/// `DELETE /api/tags/:id`
pub async fn delete(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    svc::delete_tag(&state.pool, &auth.caller, id).await.map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}
