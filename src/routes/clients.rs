//! Client routes, including tag assignment.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use uuid::Uuid;

use super::{ApiError, store_error};
use crate::models::{Client, ClientPatch, NewClient, Tag};
use crate::routes::auth::AuthUser;
use crate::services::clients::{self as svc, ClientFilter};
use crate::state::AppState;

/// `GET /api/clients?status=&search=`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<ClientFilter>,
) -> Result<Json<Vec<Client>>, ApiError> {
    let rows = svc::list_clients(&state.pool, &auth.caller, &filter)
        .await
        .map_err(store_error)?;
    Ok(Json(rows))
}

/// `GET /api/clients/:id`
pub async fn get(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> Result<Json<Client>, ApiError> {
    let row = svc::get_client(&state.pool, &auth.caller, id).await.map_err(store_error)?;
    Ok(Json(row))
}

/// `POST /api/clients`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewClient>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let row = svc::create_client(&state.pool, &auth.caller, &body)
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `PATCH /api/clients/:id`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ClientPatch>,
) -> Result<Json<Client>, ApiError> {
    let row = svc::update_client(&state.pool, &auth.caller, id, &body)
        .await
        .map_err(store_error)?;
    Ok(Json(row))
}

/// `DELETE /api/clients/:id`
pub async fn delete(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    svc::delete_client(&state.pool, &auth.caller, id).await.map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/clients/:id/tags`
pub async fn list_tags(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    let rows = svc::list_client_tags(&state.pool, &auth.caller, id)
        .await
        .map_err(store_error)?;
    Ok(Json(rows))
}

/// `PUT /api/clients/:id/tags/:tag_id`
pub async fn assign_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, tag_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    svc::assign_tag(&state.pool, &auth.caller, id, tag_id)
        .await
        .map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/clients/:id/tags/:tag_id`
pub async fn unassign_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((id, tag_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    svc::unassign_tag(&state.pool, &auth.caller, id, tag_id)
        .await
        .map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}
