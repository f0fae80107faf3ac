//! Dashboard summary route.

use axum::extract::State;
use axum::response::Json;

use super::{ApiError, store_error};
use crate::models::DashboardSummary;
use crate::routes::auth::AuthUser;
use crate::services::dashboard as svc;
use crate::state::AppState;

/// `GET /api/dashboard` — totals visible to the caller.
pub async fn summary(State(state): State<AppState>, auth: AuthUser) -> Result<Json<DashboardSummary>, ApiError> {
    let row = svc::summary(&state.pool, &auth.caller).await.map_err(store_error)?;
    Ok(Json(row))
}
