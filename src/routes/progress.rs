//! Progress step routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, store_error};
use crate::models::{NewProgressStep, ProgressStep, ProgressStepPatch};
use crate::routes::auth::AuthUser;
use crate::services::progress as svc;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepQuery {
    pub client_id: Uuid,
}

#[derive(Deserialize)]
pub struct CommentBody {
    pub body: String,
}

/// `GET /api/steps?clientId=`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<StepQuery>,
) -> Result<Json<Vec<ProgressStep>>, ApiError> {
    let rows = svc::list_steps(&state.pool, &auth.caller, query.client_id)
        .await
        .map_err(store_error)?;
    Ok(Json(rows))
}

/// `POST /api/steps`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewProgressStep>,
) -> Result<(StatusCode, Json<ProgressStep>), ApiError> {
    let row = svc::create_step(&state.pool, &auth.caller, &body)
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `PATCH /api/steps/:id`
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ProgressStepPatch>,
) -> Result<Json<ProgressStep>, ApiError> {
    let row = svc::update_step(&state.pool, &auth.caller, id, &body)
        .await
        .map_err(store_error)?;
    Ok(Json(row))
}

/// `POST /api/steps/:id/toggle` — flip completion.
pub async fn toggle(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ProgressStep>, ApiError> {
    let row = svc::toggle_step(&state.pool, &auth.caller, id).await.map_err(store_error)?;
    Ok(Json(row))
}

/// `POST /api/steps/:id/comments` — append a comment signed by the caller.
pub async fn comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<CommentBody>,
) -> Result<Json<ProgressStep>, ApiError> {
    let author = if auth.profile.full_name.trim().is_empty() {
        auth.profile.email.as_str()
    } else {
        auth.profile.full_name.as_str()
    };
    let row = svc::add_comment(&state.pool, &auth.caller, id, author, &body.body)
        .await
        .map_err(store_error)?;
    Ok(Json(row))
}

/// `DELETE /api/steps/:id`
pub async fn delete(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    svc::delete_step(&state.pool, &auth.caller, id).await.map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}
