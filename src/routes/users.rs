//! User profile routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use super::{ApiError, store_error};
use crate::models::{NewUser, ProfilePatch, UserProfile};
use crate::routes::auth::AuthUser;
use crate::services::users as svc;
use crate::state::AppState;

/// `GET /api/users`
pub async fn list(State(state): State<AppState>, auth: AuthUser) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let rows = svc::list_profiles(&state.pool, &auth.caller).await.map_err(store_error)?;
    Ok(Json(rows))
}

/// `GET /api/users/:id`
pub async fn get(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError> {
    let row = svc::get_profile(&state.pool, &auth.caller, id).await.map_err(store_error)?;
    Ok(Json(row))
}

/// `POST /api/users` — create an account with credentials.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let row = svc::create_user(&state.pool, &auth.caller, &body)
        .await
        .map_err(store_error)?;
    tracing::info!(created_by = %auth.caller.user_id, user_id = %row.id, role = %row.role, "user created");
    Ok((StatusCode::CREATED, Json(row)))
}

/// `PATCH /api/users/:id`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ProfilePatch>,
) -> Result<Json<UserProfile>, ApiError> {
    let row = svc::update_profile(&state.pool, &auth.caller, id, &body)
        .await
        .map_err(store_error)?;
    Ok(Json(row))
}

/// `DELETE /api/users/:id`
pub async fn delete(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    svc::delete_user(&state.pool, &auth.caller, id).await.map_err(store_error)?;
    tracing::info!(deleted_by = %auth.caller.user_id, user_id = %id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
