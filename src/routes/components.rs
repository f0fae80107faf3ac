//! Package component routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, store_error};
use crate::models::{Component, ComponentPatch, NewComponent};
use crate::routes::auth::AuthUser;
use crate::services::components as svc;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentQuery {
    pub client_id: Uuid,
}

/// `GET /api/components?clientId=`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ComponentQuery>,
) -> Result<Json<Vec<Component>>, ApiError> {
    let rows = svc::list_components(&state.pool, &auth.caller, query.client_id)
        .await
        .map_err(store_error)?;
    Ok(Json(rows))
}

/// `POST /api/components`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewComponent>,
) -> Result<(StatusCode, Json<Component>), ApiError> {
    let row = svc::create_component(&state.pool, &auth.caller, &body)
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `PATCH /api/components/:id`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ComponentPatch>,
) -> Result<Json<Component>, ApiError> {
    let row = svc::update_component(&state.pool, &auth.caller, id, &body)
        .await
        .map_err(store_error)?;
    Ok(Json(row))
}

/// `DELETE /api/components/:id`
pub async fn delete(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    svc::delete_component(&state.pool, &auth.caller, id)
        .await
        .map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}
