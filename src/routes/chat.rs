//! Chat and message routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, store_error};
use crate::models::{Chat, ChatMessage, NewChat, NewChatMessage};
use crate::routes::auth::AuthUser;
use crate::services::chat as svc;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatQuery {
    pub client_id: Option<Uuid>,
}

/// `GET /api/chats?clientId=`
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ChatQuery>,
) -> Result<Json<Vec<Chat>>, ApiError> {
    let rows = svc::list_chats(&state.pool, &auth.caller, query.client_id)
        .await
        .map_err(store_error)?;
    Ok(Json(rows))
}

/// `POST /api/chats`
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<NewChat>,
) -> Result<(StatusCode, Json<Chat>), ApiError> {
    let row = svc::create_chat(&state.pool, &auth.caller, &body)
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `DELETE /api/chats/:id`
pub async fn delete(State(state): State<AppState>, auth: AuthUser, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    svc::delete_chat(&state.pool, &auth.caller, id).await.map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/chats/:id/messages` — most recent messages, oldest first.
pub async fn list_messages(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessage>>, ApiError> {
    let rows = svc::list_messages(&state.pool, &auth.caller, id)
        .await
        .map_err(store_error)?;
    Ok(Json(rows))
}

/// `POST /api/chats/:id/messages`
pub async fn post_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<NewChatMessage>,
) -> Result<(StatusCode, Json<ChatMessage>), ApiError> {
    let row = svc::post_message(&state.pool, &auth.caller, id, &body)
        .await
        .map_err(store_error)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `DELETE /api/messages/:id`
pub async fn delete_message(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    svc::delete_message(&state.pool, &auth.caller, id)
        .await
        .map_err(store_error)?;
    Ok(StatusCode::NO_CONTENT)
}
